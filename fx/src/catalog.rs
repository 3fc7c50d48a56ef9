//! Rate catalog trait and the in-memory catalog.

use async_trait::async_trait;
use cambio_common::{Currency, RateRecord, RateType};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conversion::{round_money, round_rate};
use crate::error::{FxError, FxResult};
use crate::policy::{check_fees, RateInvariant};

/// Source of stored rate records consumed by the conversion engine.
#[async_trait]
pub trait RateCatalog: Send + Sync {
    /// Get the catalog name.
    fn name(&self) -> &str;

    /// Get the current record for a currency.
    async fn get_rate(&self, code: &Currency) -> FxResult<RateRecord>;

    /// Get the record of the bridge currency all conversions route through.
    async fn get_bridge_rate(&self) -> FxResult<RateRecord>;

    /// Get every record, ordered by code.
    async fn list_rates(&self) -> Vec<RateRecord>;
}

/// Configuration for catalog management operations.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Ordering enforced on buy/sell when adding or repricing.
    pub invariant: RateInvariant,
    /// Maximum quoted buy/sell spread, in percent of the buy rate.
    pub max_spread_pct: Decimal,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            invariant: RateInvariant::default(),
            max_spread_pct: Decimal::TEN,
        }
    }
}

/// Serialized catalog contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Bridge currency code.
    pub bridge: Currency,
    pub rates: Vec<RateRecord>,
}

/// Input for [`InMemoryRateCatalog::add_currency`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCurrency {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub rate_type: RateType,
    pub buy_rate: Decimal,
    pub sell_rate: Decimal,
    #[serde(default)]
    pub bank_fee: Decimal,
    #[serde(default)]
    pub platform_fee: Decimal,
    #[serde(default)]
    pub spread: Decimal,
}

/// Partial update for [`InMemoryRateCatalog::update_rate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateUpdate {
    pub buy_rate: Option<Decimal>,
    pub sell_rate: Option<Decimal>,
    pub bank_fee: Option<Decimal>,
    pub platform_fee: Option<Decimal>,
    pub spread: Option<Decimal>,
}

impl RateUpdate {
    /// Reprice buy and sell.
    pub fn rates(buy_rate: Decimal, sell_rate: Decimal) -> Self {
        Self {
            buy_rate: Some(buy_rate),
            sell_rate: Some(sell_rate),
            ..Default::default()
        }
    }

    fn touches_rates(&self) -> bool {
        self.buy_rate.is_some() || self.sell_rate.is_some()
    }

    fn apply(&self, record: &mut RateRecord) {
        if let Some(v) = self.buy_rate {
            record.buy_rate = v;
        }
        if let Some(v) = self.sell_rate {
            record.sell_rate = v;
        }
        if let Some(v) = self.bank_fee {
            record.bank_fee = v;
        }
        if let Some(v) = self.platform_fee {
            record.platform_fee = v;
        }
        if let Some(v) = self.spread {
            record.spread = v;
        }
    }
}

/// A record together with its derived quote figures.
///
/// A figure is `None` when the stored rates cannot produce it, e.g. a zero
/// buy rate loaded from a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RateQuote {
    #[serde(flatten)]
    pub record: RateRecord,
    pub mid_rate: Option<Decimal>,
    pub quoted_spread_pct: Option<Decimal>,
}

impl From<RateRecord> for RateQuote {
    fn from(record: RateRecord) -> Self {
        Self {
            mid_rate: record.mid_rate().map(round_rate),
            quoted_spread_pct: record.quoted_spread_pct().map(round_money),
            record,
        }
    }
}

/// Thread-safe in-memory catalog keyed by currency code.
pub struct InMemoryRateCatalog {
    records: DashMap<Currency, RateRecord>,
    /// Code of the base record. Held across the uniqueness check and insert.
    base: Mutex<Option<Currency>>,
    bridge: Currency,
    config: CatalogConfig,
}

impl InMemoryRateCatalog {
    /// Create an empty catalog routing through `bridge`.
    pub fn new(bridge: Currency) -> Self {
        Self::with_config(bridge, CatalogConfig::default())
    }

    /// Create an empty catalog with custom configuration.
    pub fn with_config(bridge: Currency, config: CatalogConfig) -> Self {
        Self {
            records: DashMap::new(),
            base: Mutex::new(None),
            bridge,
            config,
        }
    }

    /// Load a snapshot.
    ///
    /// Codes, names, duplicates and base uniqueness are checked. Buy/sell
    /// ordering is not: a badly priced record loads, and the engine rejects
    /// any conversion that touches it.
    pub fn from_snapshot(snapshot: CatalogSnapshot, config: CatalogConfig) -> FxResult<Self> {
        let catalog = Self::with_config(Currency::new(snapshot.bridge.code()), config);

        for record in snapshot.rates {
            catalog.insert_record(record)?;
        }

        if !catalog.records.contains_key(&catalog.bridge) {
            return Err(FxError::CurrencyNotFound(catalog.bridge.clone()));
        }

        info!(
            bridge = %catalog.bridge,
            currencies = catalog.len(),
            "Loaded rate catalog snapshot"
        );

        Ok(catalog)
    }

    /// Export the current contents.
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            bridge: self.bridge.clone(),
            rates: self.sorted_records(),
        }
    }

    /// The bridge currency code.
    pub fn bridge(&self) -> &Currency {
        &self.bridge
    }

    /// Add a currency.
    pub fn add_currency(&self, new: NewCurrency) -> FxResult<RateRecord> {
        let code = Currency::parse(&new.code)
            .map_err(|_| FxError::InvalidCurrencyCode(new.code.clone()))?;

        let mut record = RateRecord::new(code, new.name.trim(), new.rate_type, new.buy_rate, new.sell_rate)
            .with_fees(new.bank_fee, new.platform_fee, new.spread);
        record.normalize_base();

        self.validate_pricing(&record)?;
        self.insert_record(record.clone())?;

        info!(
            currency = %record.code,
            rate_type = %record.rate_type,
            buy_rate = %record.buy_rate,
            sell_rate = %record.sell_rate,
            "Added currency"
        );

        Ok(record)
    }

    /// Reprice a currency or change its fees.
    pub fn update_rate(&self, code: &Currency, update: RateUpdate) -> FxResult<RateRecord> {
        let mut entry = self
            .records
            .get_mut(code)
            .ok_or_else(|| FxError::CurrencyNotFound(code.clone()))?;

        if entry.is_base() && update.touches_rates() {
            return Err(FxError::BaseCurrencyImmutable(code.clone()));
        }

        let mut candidate = entry.value().clone();
        update.apply(&mut candidate);
        self.validate_pricing(&candidate)?;

        candidate.touch();
        *entry = candidate.clone();

        info!(
            currency = %code,
            buy_rate = %candidate.buy_rate,
            sell_rate = %candidate.sell_rate,
            "Updated rate"
        );

        Ok(candidate)
    }

    /// Remove a currency. The base and bridge currencies stay.
    pub fn remove_currency(&self, code: &Currency) -> FxResult<RateRecord> {
        if let Some(record) = self.records.get(code) {
            if record.is_base() {
                return Err(FxError::BaseCurrencyImmutable(code.clone()));
            }
        }
        if *code == self.bridge {
            return Err(FxError::BridgeCurrencyRequired(code.clone()));
        }

        let (_, removed) = self
            .records
            .remove(code)
            .ok_or_else(|| FxError::CurrencyNotFound(code.clone()))?;

        info!(currency = %code, "Removed currency");
        Ok(removed)
    }

    /// The base currency, if one is stored.
    pub fn base_currency(&self) -> Option<RateRecord> {
        let code = self.base.lock().clone()?;
        self.records.get(&code).map(|r| r.value().clone())
    }

    /// Quote for a single currency.
    pub fn quote(&self, code: &Currency) -> FxResult<RateQuote> {
        self.records
            .get(code)
            .map(|r| RateQuote::from(r.value().clone()))
            .ok_or_else(|| FxError::CurrencyNotFound(code.clone()))
    }

    /// Quotes for every currency, ordered by code.
    pub fn quotes(&self) -> Vec<RateQuote> {
        self.sorted_records().into_iter().map(RateQuote::from).collect()
    }

    /// Get the number of currencies.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn sorted_records(&self) -> Vec<RateRecord> {
        let mut records: Vec<RateRecord> = self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.code.cmp(&b.code));
        records
    }

    fn insert_record(&self, mut record: RateRecord) -> FxResult<()> {
        record.code = Currency::new(record.code.code());
        if !record.code.is_valid() {
            return Err(FxError::InvalidCurrencyCode(record.code.code().to_string()));
        }
        if record.name.trim().is_empty() {
            return Err(FxError::InvalidCurrencyName(record.code));
        }
        if !record.is_base() {
            return self.insert_vacant(record);
        }

        let mut base = self.base.lock();
        if let Some(existing) = base.as_ref() {
            return Err(FxError::BaseCurrencyExists {
                existing: existing.clone(),
            });
        }
        record.normalize_base();
        let code = record.code.clone();
        self.insert_vacant(record)?;
        *base = Some(code);
        Ok(())
    }

    fn insert_vacant(&self, record: RateRecord) -> FxResult<()> {
        match self.records.entry(record.code.clone()) {
            Entry::Occupied(_) => Err(FxError::DuplicateCurrency(record.code)),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    /// Validation applied to records written through the management API.
    fn validate_pricing(&self, record: &RateRecord) -> FxResult<()> {
        self.config.invariant.check(record)?;

        if !record.is_base() {
            let spread_pct = record
                .quoted_spread_pct()
                .ok_or(FxError::ArithmeticOverflow("quotedSpreadPct"))?;
            if spread_pct > self.config.max_spread_pct {
                return Err(FxError::SpreadTooWide {
                    currency: record.code.clone(),
                    spread_pct: round_money(spread_pct),
                    max_pct: self.config.max_spread_pct,
                });
            }
        }

        check_fees(record)
    }
}

#[async_trait]
impl RateCatalog for InMemoryRateCatalog {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn get_rate(&self, code: &Currency) -> FxResult<RateRecord> {
        match self.records.get(code) {
            Some(record) => {
                debug!(currency = %code, "Catalog hit");
                Ok(record.value().clone())
            }
            None => {
                warn!(currency = %code, "Currency not in catalog");
                Err(FxError::CurrencyNotFound(code.clone()))
            }
        }
    }

    async fn get_bridge_rate(&self) -> FxResult<RateRecord> {
        self.get_rate(&self.bridge).await
    }

    async fn list_rates(&self) -> Vec<RateRecord> {
        self.sorted_records()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_currency(code: &str, buy: Decimal, sell: Decimal) -> NewCurrency {
        NewCurrency {
            code: code.to_string(),
            name: format!("{} currency", code),
            rate_type: RateType::Fiat,
            buy_rate: buy,
            sell_rate: sell,
            bank_fee: dec!(0.01),
            platform_fee: Decimal::ZERO,
            spread: dec!(0.02),
        }
    }

    fn seeded() -> InMemoryRateCatalog {
        let catalog = InMemoryRateCatalog::new(Currency::usdt());
        catalog
            .add_currency(NewCurrency {
                rate_type: RateType::Base,
                platform_fee: dec!(0.01),
                ..new_currency("USDT", dec!(1), dec!(1))
            })
            .unwrap();
        catalog.add_currency(new_currency("BRL", dec!(5.00), dec!(4.80))).unwrap();
        catalog
    }

    #[tokio::test]
    async fn test_get_rate_and_bridge() {
        let catalog = seeded();

        let brl = catalog.get_rate(&Currency::brl()).await.unwrap();
        assert_eq!(brl.buy_rate, dec!(5.00));

        let bridge = catalog.get_bridge_rate().await.unwrap();
        assert_eq!(bridge.code, Currency::usdt());
        assert_eq!(bridge.platform_fee, dec!(0.01));
    }

    #[tokio::test]
    async fn test_missing_currency() {
        let catalog = seeded();

        let result = catalog.get_rate(&Currency::bob()).await;

        assert_eq!(result, Err(FxError::CurrencyNotFound(Currency::bob())));
    }

    #[test]
    fn test_add_normalizes_code() {
        let catalog = seeded();

        let record = catalog.add_currency(new_currency("bob", dec!(0.70), dec!(0.68))).unwrap();

        assert_eq!(record.code, Currency::bob());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let catalog = seeded();

        assert!(matches!(
            catalog.add_currency(new_currency("B0B", dec!(0.70), dec!(0.68))),
            Err(FxError::InvalidCurrencyCode(_))
        ));
        assert!(matches!(
            catalog.add_currency(new_currency("BRL", dec!(5.10), dec!(4.90))),
            Err(FxError::DuplicateCurrency(_))
        ));
        assert!(matches!(
            catalog.add_currency(new_currency("BOB", dec!(0.68), dec!(0.70))),
            Err(FxError::InvalidRateConfiguration { .. })
        ));
        assert!(matches!(
            catalog.add_currency(NewCurrency {
                name: "  ".to_string(),
                ..new_currency("ARS", dec!(0.01), dec!(0.0099))
            }),
            Err(FxError::InvalidCurrencyName(_))
        ));
    }

    #[test]
    fn test_spread_cap() {
        let catalog = seeded();

        let result = catalog.add_currency(new_currency("BOB", dec!(0.80), dec!(0.70)));

        assert!(matches!(result, Err(FxError::SpreadTooWide { .. })));
    }

    #[test]
    fn test_unrepresentable_spread_is_an_error() {
        let catalog = InMemoryRateCatalog::with_config(
            Currency::usdt(),
            CatalogConfig {
                invariant: RateInvariant::SellAboveBuy,
                ..Default::default()
            },
        );

        let result = catalog.add_currency(new_currency("ABC", Decimal::new(1, 27), dec!(1)));

        assert_eq!(result, Err(FxError::ArithmeticOverflow("quotedSpreadPct")));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_quote_of_zero_buy_rate_has_no_spread() {
        let snapshot = CatalogSnapshot {
            bridge: Currency::usdt(),
            rates: vec![
                RateRecord::base(Currency::usdt(), "Tether"),
                RateRecord::new(Currency::brl(), "Real", RateType::Fiat, Decimal::ZERO, dec!(4.8)),
            ],
        };
        let catalog = InMemoryRateCatalog::from_snapshot(snapshot, CatalogConfig::default()).unwrap();

        let quote = catalog.quote(&Currency::brl()).unwrap();

        assert_eq!(quote.quoted_spread_pct, None);
        assert_eq!(quote.mid_rate, Some(dec!(2.4)));
    }

    #[test]
    fn test_quote_rounds_half_away_from_zero() {
        let catalog = seeded();
        catalog.add_currency(new_currency("ARS", dec!(4.9005), dec!(4.9000))).unwrap();

        let quote = catalog.quote(&Currency::new("ARS")).unwrap();

        // Mid is exactly 4.90025.
        assert_eq!(quote.mid_rate, Some(dec!(4.9003)));
    }

    #[test]
    fn test_single_base_forced_to_parity() {
        let catalog = seeded();
        let base = catalog.base_currency().unwrap();
        assert_eq!(base.code, Currency::usdt());
        assert!(base.is_at_parity());

        let result = catalog.add_currency(NewCurrency {
            rate_type: RateType::Base,
            ..new_currency("USDC", dec!(1), dec!(1))
        });
        assert_eq!(result, Err(FxError::BaseCurrencyExists { existing: Currency::usdt() }));
    }

    #[test]
    fn test_concurrent_base_adds_keep_one_base() {
        let catalog = InMemoryRateCatalog::new(Currency::usdt());
        let codes = ["USDT", "USDC", "DAI", "EURC"];
        let gate = std::sync::Barrier::new(codes.len());

        let accepted = std::thread::scope(|s| {
            let handles: Vec<_> = codes
                .iter()
                .map(|code| {
                    let (catalog, gate) = (&catalog, &gate);
                    s.spawn(move || {
                        gate.wait();
                        catalog
                            .add_currency(NewCurrency {
                                rate_type: RateType::Base,
                                ..new_currency(code, dec!(1), dec!(1))
                            })
                            .is_ok()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count()
        });

        assert_eq!(accepted, 1);
        let bases: Vec<_> = catalog.quotes().into_iter().filter(|q| q.record.is_base()).collect();
        assert_eq!(bases.len(), 1);
        assert_eq!(catalog.base_currency().map(|b| b.code), Some(bases[0].record.code.clone()));
    }

    #[test]
    fn test_update_rate_refreshes_timestamp() {
        let catalog = seeded();
        let before = catalog.quote(&Currency::brl()).unwrap().record.last_updated;

        let updated = catalog
            .update_rate(&Currency::brl(), RateUpdate::rates(dec!(5.20), dec!(5.00)))
            .unwrap();

        assert_eq!(updated.buy_rate, dec!(5.20));
        assert!(updated.last_updated >= before);
        assert_eq!(catalog.quote(&Currency::brl()).unwrap().record.sell_rate, dec!(5.00));
    }

    #[test]
    fn test_update_rejects_invalid_and_keeps_old_value() {
        let catalog = seeded();

        let result = catalog.update_rate(&Currency::brl(), RateUpdate::rates(dec!(4.00), dec!(5.00)));

        assert!(matches!(result, Err(FxError::InvalidRateConfiguration { .. })));
        assert_eq!(catalog.quote(&Currency::brl()).unwrap().record.buy_rate, dec!(5.00));
    }

    #[test]
    fn test_base_rates_immutable_but_fees_editable() {
        let catalog = seeded();

        let result = catalog.update_rate(&Currency::usdt(), RateUpdate::rates(dec!(1.1), dec!(1)));
        assert_eq!(result, Err(FxError::BaseCurrencyImmutable(Currency::usdt())));

        let updated = catalog
            .update_rate(
                &Currency::usdt(),
                RateUpdate {
                    platform_fee: Some(dec!(0.02)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.platform_fee, dec!(0.02));
    }

    #[test]
    fn test_remove_currency() {
        let catalog = seeded();

        assert_eq!(
            catalog.remove_currency(&Currency::usdt()),
            Err(FxError::BaseCurrencyImmutable(Currency::usdt()))
        );
        assert_eq!(
            catalog.remove_currency(&Currency::bob()),
            Err(FxError::CurrencyNotFound(Currency::bob()))
        );

        let removed = catalog.remove_currency(&Currency::brl()).unwrap();
        assert_eq!(removed.code, Currency::brl());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_bridge_cannot_be_removed() {
        let catalog = InMemoryRateCatalog::new(Currency::usdt());
        catalog
            .add_currency(new_currency("USDT", dec!(1.01), dec!(0.99)))
            .unwrap();

        assert_eq!(
            catalog.remove_currency(&Currency::usdt()),
            Err(FxError::BridgeCurrencyRequired(Currency::usdt()))
        );
    }

    #[test]
    fn test_snapshot_loading() {
        let json = r#"{
            "bridge": "usdt",
            "rates": [
                {"code": "USDT", "name": "Tether", "rate_type": "base", "buy_rate": 1, "sell_rate": 1, "platform_fee": "0.01"},
                {"code": "BRL", "name": "Real", "buy_rate": "4.80", "sell_rate": "5.00"}
            ]
        }"#;
        let snapshot: CatalogSnapshot = serde_json::from_str(json).unwrap();

        let catalog = InMemoryRateCatalog::from_snapshot(snapshot, CatalogConfig::default()).unwrap();

        assert_eq!(catalog.bridge(), &Currency::usdt());
        assert_eq!(catalog.len(), 2);
        // Loaded as-is even though the ordering is inverted.
        assert_eq!(catalog.quote(&Currency::brl()).unwrap().record.sell_rate, dec!(5.00));
        assert_eq!(catalog.snapshot().rates[0].code, Currency::brl());
    }

    #[test]
    fn test_snapshot_requires_bridge() {
        let snapshot = CatalogSnapshot {
            bridge: Currency::usdt(),
            rates: vec![RateRecord::new(Currency::brl(), "Real", RateType::Fiat, dec!(5), dec!(4.8))],
        };

        let result = InMemoryRateCatalog::from_snapshot(snapshot, CatalogConfig::default());

        assert!(matches!(result, Err(FxError::CurrencyNotFound(c)) if c == Currency::usdt()));
    }

    #[test]
    fn test_quotes_are_sorted() {
        let catalog = seeded();
        catalog.add_currency(new_currency("BOB", dec!(0.70), dec!(0.68))).unwrap();

        let quotes = catalog.quotes();
        let codes: Vec<&str> = quotes.iter().map(|q| q.record.code.code()).collect();

        assert_eq!(codes, vec!["BOB", "BRL", "USDT"]);
        assert_eq!(quotes[1].mid_rate, Some(dec!(4.90)));
        assert_eq!(quotes[1].quoted_spread_pct, Some(dec!(4.00)));
    }
}
