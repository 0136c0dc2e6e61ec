use crate::models::{CanonicalProduct, PriceChannel, RawRecord};
use crate::utils::error::Result;

/// Maps provider records onto [`CanonicalProduct`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    channel: PriceChannel,
}

impl Normalizer {
    pub fn new(channel: PriceChannel) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> PriceChannel {
        self.channel
    }

    /// The price is the last observation of the configured channel, not an
    /// average or minimum; an empty series yields zero.
    pub fn normalize(&self, raw: &RawRecord) -> Result<CanonicalProduct> {
        let price = raw.price_series(self.channel)?.last_value();

        Ok(CanonicalProduct {
            asin: raw.asin.clone(),
            title: raw.title.clone(),
            price,
            brand: raw.brand.clone(),
            description: raw.description.clone(),
            features: raw.features.clone().unwrap_or_default(),
            categories: raw.categories.clone().unwrap_or_default(),
            images: raw.image_urls(),
            category_label: raw.category_label(),
        })
    }
}
