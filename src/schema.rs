// signalboard/src/schema.rs
//
// Fixed metric/asset tables and the ordered column schema of the history
// table. Everything here is static; the column order is decided once and
// every load/append goes through it, so reloads stay schema-stable no
// matter how callers iterate the tables.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub name: &'static str,
    pub code: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub id: &'static str,
    pub symbol: &'static str,
}

pub const CRITERIA: [Metric; 12] = [
    Metric { name: "Marktplatzierung", code: "Rank" },
    Metric { name: "Soziale Aktivität", code: "Posts" },
    Metric { name: "Entwicklungsaktivität", code: "Commits" },
    Metric { name: "Netzwerkaktivität", code: "Txs" },
    Metric { name: "Liquidität", code: "Liquidity" },
    Metric { name: "Volatilität", code: "Volatility" },
    Metric { name: "Adoption", code: "Users" },
    Metric { name: "Medienpräsenz", code: "Mentions" },
    Metric { name: "Partnerschaften", code: "Partners" },
    Metric { name: "Tokenomics", code: "Supply" },
    Metric { name: "Community", code: "Members" },
    Metric { name: "Innovation", code: "Score" },
];

pub const ASSETS: [Asset; 3] = [
    Asset { id: "bitcoin", symbol: "BTC" },
    Asset { id: "ethereum", symbol: "ETH" },
    Asset { id: "cardano", symbol: "ADA" },
];

pub fn price_column(asset: &Asset) -> String {
    format!("{}-price", asset.id)
}

pub fn volume_column(asset: &Asset) -> String {
    format!("{}-volume", asset.id)
}

/// The canonical value-column order: the 12 criteria in declaration order,
/// then a (price, volume) pair per asset. The timestamp key is not listed;
/// it is always the first CSV column.
pub fn column_order() -> Vec<String> {
    let mut cols: Vec<String> = CRITERIA.iter().map(|m| m.name.to_string()).collect();
    for asset in &ASSETS {
        cols.push(price_column(asset));
        cols.push(volume_column(asset));
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_order_is_criteria_then_asset_pairs() {
        let cols = column_order();
        assert_eq!(cols.len(), 18);
        assert_eq!(cols[0], "Marktplatzierung");
        assert_eq!(cols[11], "Innovation");
        assert_eq!(cols[12], "bitcoin-price");
        assert_eq!(cols[13], "bitcoin-volume");
        assert_eq!(cols[17], "cardano-volume");
    }

    #[test]
    fn column_order_is_stable_across_calls() {
        assert_eq!(column_order(), column_order());
    }

    #[test]
    fn tables_have_expected_sizes() {
        assert_eq!(CRITERIA.len(), 12);
        assert_eq!(ASSETS.len(), 3);
        assert_eq!(ASSETS[0].symbol, "BTC");
    }
}
