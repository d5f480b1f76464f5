use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use common::{AssetPairInfo, MarketDataSource, PairId, Result};

/// Selects the USD-quoted, non-stablecoin pairs worth scanning.
#[derive(Debug, Clone)]
pub struct CatalogResolver {
    excluded_bases: HashSet<String>,
}

impl CatalogResolver {
    pub fn new<I, S>(excluded_bases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded_bases: excluded_bases
                .into_iter()
                .map(|b| b.as_ref().to_uppercase())
                .collect(),
        }
    }

    /// Fetch the exchange catalog and return eligible pairs sorted by id.
    /// A failed fetch is returned as-is; there is no partial catalog.
    pub async fn resolve(&self, source: &dyn MarketDataSource) -> Result<Vec<PairId>> {
        let catalog = source.asset_pairs().await?;
        let listed = catalog.len();
        let pairs = self.filter(catalog);
        info!(listed, eligible = pairs.len(), "Resolved market catalog");
        Ok(pairs)
    }

    pub fn filter(&self, catalog: HashMap<PairId, AssetPairInfo>) -> Vec<PairId> {
        let mut pairs: Vec<PairId> = catalog
            .into_iter()
            .filter(|(id, info)| {
                let keep = self.is_eligible(info);
                if !keep {
                    debug!(pair = %id, "Pair excluded from scan");
                }
                keep
            })
            .map(|(id, _)| id)
            .collect();
        pairs.sort();
        pairs
    }

    pub fn is_eligible(&self, info: &AssetPairInfo) -> bool {
        let usd_quoted = normalize_asset(&info.quote) == "USD" || info.altname.ends_with("USD");
        if !usd_quoted {
            return false;
        }

        // Base code and display name are checked separately: either can
        // carry the fiat/stablecoin ticker when the other does not.
        if self.excluded_bases.contains(normalize_asset(&info.base)) {
            return false;
        }
        let display_base = info
            .wsname
            .as_deref()
            .and_then(|ws| ws.split_once('/'))
            .map(|(base, _)| base);
        !display_base.is_some_and(|b| self.excluded_bases.contains(b))
    }
}

/// Strip Kraken's one-letter asset-class prefix from four-character codes
/// (`XXBT` → `XBT`, `ZUSD` → `USD`). Other codes are returned unchanged.
pub fn normalize_asset(code: &str) -> &str {
    if code.len() == 4 && (code.starts_with('X') || code.starts_with('Z')) {
        &code[1..]
    } else {
        code
    }
}
