//! Data loading and saving utilities
//!
//! Provides functions to load and save market, earnings, and enriched
//! data to/from CSV files. All data is assumed pre-downloaded; a missing
//! file is fatal and propagated with context.

use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{Reader, Writer};
use serde::Deserialize;
use tracing::info;

use super::types::{EarningsEvent, EnrichedEvent, PriceObservation};

/// Data loader for CSV files
pub struct DataLoader;

impl DataLoader {
    /// Load daily price observations from a market data CSV
    pub fn load_market<P: AsRef<Path>>(path: P) -> Result<Vec<PriceObservation>> {
        info!("Reading market data from {:?}", path.as_ref());
        let file = File::open(&path)
            .with_context(|| format!("Failed to open market data file: {:?}", path.as_ref()))?;

        let mut reader = Reader::from_reader(file);
        let mut prices = Vec::new();

        for result in reader.deserialize() {
            let price: PriceObservation = result.context("Failed to parse price row")?;
            prices.push(price);
        }

        // Sort by (ticker, date) so per-ticker slices are chronological
        prices.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.date.cmp(&b.date)));

        info!("Loaded {} price rows", prices.len());
        Ok(prices)
    }

    /// Load earnings events from every CSV file in a directory
    ///
    /// The earnings table is typically downloaded one file per batch of
    /// tickers; this concatenates all of them.
    pub fn load_earnings_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<EarningsEvent>> {
        info!("Reading EPS data from {:?}", dir.as_ref());
        let entries = std::fs::read_dir(&dir)
            .with_context(|| format!("Failed to read EPS directory: {:?}", dir.as_ref()))?;

        let mut events = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            events.extend(Self::load_earnings(&path)?);
        }

        events.sort_by(|a, b| a.ticker.cmp(&b.ticker).then(a.event_date.cmp(&b.event_date)));

        info!("Loaded {} earnings events", events.len());
        Ok(events)
    }

    /// Load earnings events from a single CSV file
    pub fn load_earnings<P: AsRef<Path>>(path: P) -> Result<Vec<EarningsEvent>> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open EPS file: {:?}", path.as_ref()))?;

        let mut reader = Reader::from_reader(file);
        let mut events = Vec::new();

        for result in reader.deserialize() {
            let event: EarningsEvent = result.context("Failed to parse earnings row")?;
            events.push(event);
        }

        Ok(events)
    }

    /// Load the liquidity allow-list of tickers
    ///
    /// The file has a single `Ticker` column.
    pub fn load_selected_tickers<P: AsRef<Path>>(path: P) -> Result<HashSet<String>> {
        #[derive(Deserialize)]
        struct Row {
            #[serde(rename = "Ticker")]
            ticker: String,
        }

        let file = File::open(&path).with_context(|| {
            format!("Failed to open selected tickers file: {:?}", path.as_ref())
        })?;

        let mut reader = Reader::from_reader(file);
        let mut tickers = HashSet::new();

        for result in reader.deserialize() {
            let row: Row = result.context("Failed to parse ticker row")?;
            tickers.insert(row.ticker);
        }

        info!("Loaded {} selected tickers", tickers.len());
        Ok(tickers)
    }

    /// Keep only price rows whose ticker is in the allow-list
    pub fn filter_by_tickers(
        prices: Vec<PriceObservation>,
        selected: &HashSet<String>,
    ) -> Vec<PriceObservation> {
        let before = prices.len();
        let kept: Vec<PriceObservation> = prices
            .into_iter()
            .filter(|p| selected.contains(&p.ticker))
            .collect();
        info!("Ticker filter kept {} of {} price rows", kept.len(), before);
        kept
    }

    /// Save the enriched table as the processed-data CSV
    pub fn save_enriched<P: AsRef<Path>>(rows: &[EnrichedEvent], path: P) -> Result<()> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        }

        let file = File::create(&path)
            .with_context(|| format!("Failed to create file: {:?}", path.as_ref()))?;

        let mut writer = Writer::from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!("Saved {} enriched rows to {:?}", rows.len(), path.as_ref());
        Ok(())
    }

    /// Load a previously saved enriched table
    pub fn load_enriched<P: AsRef<Path>>(path: P) -> Result<Vec<EnrichedEvent>> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open processed data file: {:?}", path.as_ref()))?;

        let mut reader = Reader::from_reader(file);
        let mut rows = Vec::new();

        for result in reader.deserialize() {
            let row: EnrichedEvent = result.context("Failed to parse enriched row")?;
            rows.push(row);
        }

        info!("Loaded {} enriched rows", rows.len());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_save_and_load_enriched() {
        let rows = vec![
            EnrichedEvent {
                ticker: "AAPL".to_string(),
                date: date("2024-01-05"),
                adj_close: 180.0,
                volume: 1_000_000.0,
                eps_estimate: Some(2.1),
                reported_eps: Some(2.2),
                surprise_pct: Some(4.8),
                period_max_price: Some(195.0),
                period_min_price: Some(172.0),
            },
            EnrichedEvent {
                ticker: "AAPL".to_string(),
                date: date("2024-04-05"),
                adj_close: 190.0,
                volume: 900_000.0,
                eps_estimate: Some(2.3),
                reported_eps: None,
                surprise_pct: None,
                period_max_price: None,
                period_min_price: None,
            },
        ];

        let dir = tempdir().unwrap();
        let path = dir.path().join("data_clean.csv");

        DataLoader::save_enriched(&rows, &path).unwrap();
        let loaded = DataLoader::load_enriched(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].period_max_price, Some(195.0));
        // Missing stays missing across a round trip, never becomes zero.
        assert!(loaded[1].period_max_price.is_none());
        assert!(loaded[1].surprise_pct.is_none());
    }

    #[test]
    fn test_load_market_sorts_by_ticker_and_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("market.csv");
        std::fs::write(
            &path,
            "Ticker,Date,Adj Close,Volume\n\
             MSFT,2024-01-03,370.0,1000\n\
             AAPL,2024-01-04,181.0,2000\n\
             AAPL,2024-01-03,180.0,1500\n",
        )
        .unwrap();

        let prices = DataLoader::load_market(&path).unwrap();
        assert_eq!(prices.len(), 3);
        assert_eq!(prices[0].ticker, "AAPL");
        assert_eq!(prices[0].date, date("2024-01-03"));
        assert_eq!(prices[2].ticker, "MSFT");
    }

    #[test]
    fn test_load_earnings_dir_concatenates_files() {
        let dir = tempdir().unwrap();
        let header = "Symbol,Event Start Date,EPS Estimate,Reported EPS,Surprise (%)\n";
        std::fs::write(
            dir.path().join("a.csv"),
            format!("{header}AAPL,2024-01-05,2.1,2.2,4.8\n"),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("b.csv"),
            format!("{header}MSFT,2024-01-25,2.9,,\n"),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let events = DataLoader::load_earnings_dir(dir.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].has_surprise());
        assert!(!events[1].has_surprise());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        assert!(DataLoader::load_market("no/such/file.csv").is_err());
    }

    #[test]
    fn test_filter_by_tickers() {
        let prices = vec![
            PriceObservation {
                ticker: "AAPL".to_string(),
                date: date("2024-01-03"),
                adj_close: 180.0,
                volume: 1000.0,
            },
            PriceObservation {
                ticker: "PENNY".to_string(),
                date: date("2024-01-03"),
                adj_close: 0.5,
                volume: 10.0,
            },
        ];
        let selected: HashSet<String> = ["AAPL".to_string()].into_iter().collect();

        let kept = DataLoader::filter_by_tickers(prices, &selected);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].ticker, "AAPL");
    }
}
