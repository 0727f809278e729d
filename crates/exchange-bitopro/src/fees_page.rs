//! Fees page table extraction.
//!
//! The page carries plain `<table>` elements (order limits first) and a VIP
//! fee block built from styled `div` rows under a heading. Parsing is a pure
//! function over the HTML text; where the text comes from is a
//! [`FeesPageSource`].

use crate::error::{BitoProError, Result};
use async_trait::async_trait;
use bito_qa_core::{ExchangeConfig, FeesPageLayout, RawTable};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::path::PathBuf;
use std::time::Duration;

/// Tables extracted from one rendering of the fees page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeesPageTables {
    /// Every `<table>` on the page, in document order.
    pub tables: Vec<RawTable>,
    /// The VIP fee block, `None` when it could not be located or was empty.
    pub vip_fee_table: Option<RawTable>,
}

impl FeesPageTables {
    /// The order-limits table is the first table on the page.
    #[must_use]
    pub fn order_limits_table(&self) -> Option<&RawTable> {
        self.tables.first()
    }
}

/// Somewhere the fees page HTML can be read from.
#[async_trait]
pub trait FeesPageSource: Send + Sync {
    /// Fetches the page and extracts its tables.
    async fn fetch_tables(&self, layout: &FeesPageLayout) -> Result<FeesPageTables>;
}

// =============================================================================
// Sources
// =============================================================================

/// Downloads the live page over HTTP.
///
/// Content injected by client-side scripts is not visible here; save a
/// rendered copy and use [`FixtureFeesPage`] when the live markup lacks it.
#[derive(Debug, Clone)]
pub struct HttpFeesPage {
    url: String,
    http: Client,
}

impl HttpFeesPage {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &ExchangeConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                BitoProError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            url: config.fees_page_url.clone(),
            http,
        })
    }

    /// Sets a custom page URL (useful for testing).
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl FeesPageSource for HttpFeesPage {
    async fn fetch_tables(&self, layout: &FeesPageLayout) -> Result<FeesPageTables> {
        tracing::info!(url = %self.url, "Fetching fees page");

        let response = self
            .http
            .get(&self.url)
            .header("Accept", "text/html")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BitoProError::Page(format!(
                "GET {} returned {}",
                self.url,
                status.as_u16()
            )));
        }

        let html = response.text().await?;
        parse_fees_page(&html, layout)
    }
}

/// Reads a saved copy of the page from disk.
#[derive(Debug, Clone)]
pub struct FixtureFeesPage {
    path: PathBuf,
}

impl FixtureFeesPage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeesPageSource for FixtureFeesPage {
    async fn fetch_tables(&self, layout: &FeesPageLayout) -> Result<FeesPageTables> {
        tracing::info!(path = %self.path.display(), "Reading fees page fixture");

        let html = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BitoProError::Page(format!("cannot read {}: {e}", self.path.display()))
        })?;
        parse_fees_page(&html, layout)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Extracts all `<table>` elements and the VIP fee block from page HTML.
///
/// # Errors
/// Returns [`BitoProError::Page`] only when the layout yields an invalid CSS
/// selector; unexpected markup produces empty or missing tables instead.
pub fn parse_fees_page(html: &str, layout: &FeesPageLayout) -> Result<FeesPageTables> {
    let document = Html::parse_document(html);

    let table_sel = selector("table")?;
    let header_sel = selector("thead tr th")?;
    let row_sel = selector("tbody tr")?;
    let cell_sel = selector("td")?;

    let tables: Vec<RawTable> = document
        .select(&table_sel)
        .map(|table| {
            let headers = table.select(&header_sel).map(cell_text).collect();
            let rows = table
                .select(&row_sel)
                .map(|tr| tr.select(&cell_sel).map(cell_text).collect())
                .collect();
            RawTable::from_cells(headers, rows)
        })
        .collect();

    for (index, table) in tables.iter().enumerate() {
        tracing::debug!(index, columns = ?table.columns(), rows = table.len(), "Web table");
    }

    let vip_fee_table = extract_vip_block(&document, layout)?;
    match &vip_fee_table {
        Some(table) => tracing::info!(
            tables = tables.len(),
            vip_rows = table.len(),
            "Extracted fees page tables"
        ),
        None => tracing::warn!(
            tables = tables.len(),
            heading = %layout.vip_heading_text,
            "VIP fee block not found on fees page"
        ),
    }

    Ok(FeesPageTables {
        tables,
        vip_fee_table,
    })
}

/// Heading whose text contains the configured label, then the `div` right after it.
fn extract_vip_block(document: &Html, layout: &FeesPageLayout) -> Result<Option<RawTable>> {
    if layout.vip_row_classes.is_empty() {
        return Ok(None);
    }

    let heading_sel = selector(&layout.vip_heading_tag)?;
    let row_css = layout
        .vip_row_classes
        .iter()
        .map(|class| format!(".{class}"))
        .collect::<Vec<_>>()
        .join(", ");
    let row_sel = selector(&row_css)?;
    let cell_sel = selector(&format!(".{}", layout.vip_cell_class))?;

    let Some(heading) = document
        .select(&heading_sel)
        .find(|h| h.text().collect::<String>().contains(&layout.vip_heading_text))
    else {
        return Ok(None);
    };

    let Some(container) = heading.next_siblings().find_map(ElementRef::wrap) else {
        return Ok(None);
    };
    if container.value().name() != "div" {
        return Ok(None);
    }

    let mut rows = container.select(&row_sel);
    let Some(header_row) = rows.next() else {
        return Ok(None);
    };
    let headers: Vec<String> = header_row.select(&cell_sel).map(cell_text).collect();

    let data_rows: Vec<Vec<String>> = rows
        .map(|row| row.select(&cell_sel).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .collect();

    if headers.is_empty() || data_rows.is_empty() {
        return Ok(None);
    }

    Ok(Some(RawTable::from_cells(headers, data_rows)))
}

fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| BitoProError::Page(format!("invalid selector {css:?}: {e:?}")))
}
