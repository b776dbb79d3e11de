// Offer Book - the offer registry and its single-sale state machine
//
// Holds no locks and does no I/O. `plan_*` validates a mutation against the
// current state and describes it; `insert` / `mark_sold` apply it.

use crate::identity::AccountId;
use crate::ledger::{Amount, LedgerError, ListingPolicy, Offer, OfferId, OfferPage, PaymentPolicy, Purchase};

#[derive(Clone, Debug, Default)]
pub struct OfferBook {
    /// Indexed by id: `offers[i].id() == i`
    offers: Vec<Offer>,
}

impl OfferBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored offers; `None` unless ids are exactly `0..n` in order
    pub fn from_offers(offers: Vec<Offer>) -> Option<Self> {
        let dense = offers
            .iter()
            .enumerate()
            .all(|(i, offer)| offer.id().value() == i as u64);
        dense.then_some(Self { offers })
    }

    /// Id the next created offer will get; equals the number of offers ever created
    pub fn next_offer_id(&self) -> OfferId {
        OfferId::new(self.offers.len() as u64)
    }

    pub fn len(&self) -> usize {
        self.offers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }

    pub fn get(&self, id: OfferId) -> Result<&Offer, LedgerError> {
        usize::try_from(id.value())
            .ok()
            .and_then(|index| self.offers.get(index))
            .ok_or(LedgerError::NotFound { id })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Offer> {
        self.offers.iter()
    }

    /// Count of offers still for sale
    pub fn available_count(&self) -> usize {
        self.offers.iter().filter(|o| o.is_available()).count()
    }

    /// Validate a new listing and build the offer it would create
    pub fn plan_create(
        &self,
        seller: &AccountId,
        description: String,
        price: Amount,
        listing: &ListingPolicy,
    ) -> Result<Offer, LedgerError> {
        listing.check(&description, price)?;
        Ok(Offer::new(self.next_offer_id(), *seller, description, price))
    }

    /// Append a planned offer
    pub(crate) fn insert(&mut self, offer: Offer) {
        debug_assert_eq!(offer.id(), self.next_offer_id());
        self.offers.push(offer);
    }

    /// Validate a purchase attempt and describe its outcome
    pub fn plan_purchase(
        &self,
        id: OfferId,
        buyer: &AccountId,
        payment: Amount,
        policy: PaymentPolicy,
    ) -> Result<Purchase, LedgerError> {
        let offer = self.get(id)?;
        if !offer.is_available() {
            return Err(LedgerError::AlreadySold { id });
        }
        let refund = policy.settle(offer.price(), payment)?;

        Ok(Purchase {
            offer_id: id,
            seller: *offer.seller(),
            buyer: *buyer,
            description: offer.description().to_string(),
            price: offer.price(),
            refund,
        })
    }

    /// Flip an offer to sold; returns the updated offer
    pub(crate) fn mark_sold(&mut self, id: OfferId) -> Result<&Offer, LedgerError> {
        let offer = usize::try_from(id.value())
            .ok()
            .and_then(|index| self.offers.get_mut(index))
            .ok_or(LedgerError::NotFound { id })?;
        offer.mark_sold();
        Ok(offer)
    }

    /// Offers with ids in `[offset, offset + limit)`
    pub fn page(&self, offset: u64, limit: usize) -> OfferPage {
        let total = self.offers.len() as u64;
        let start = offset.min(total) as usize;
        let end = start.saturating_add(limit).min(self.offers.len());
        let offers = self.offers[start..end].to_vec();
        let next = end as u64;

        OfferPage {
            offers,
            total,
            next_offset: (next < total).then_some(next),
        }
    }
}
