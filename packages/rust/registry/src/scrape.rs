//! Registry document parsing.
//!
//! The registry publishes one table per top-level type (`table-application`,
//! `table-image`, ...). Every row has three cells: the internal name, the
//! `type/subtype` template (usually linked to its description page) and the
//! reference. [`RowTriples`] groups the cells back into rows so the record
//! builder never deals with cell indices.

use std::sync::LazyLock;

use mimegen_shared::{MimegenError, Record, Result, Source};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Data tables carry an id with this prefix.
const TABLE_ID_PREFIX: &str = "table-";

static TABLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("table selector"));

static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").expect("td selector"));

static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("a selector"));

// ---------------------------------------------------------------------------
// Row iteration
// ---------------------------------------------------------------------------

/// One registry row as three consecutive cells.
///
/// A table whose cell count is not a multiple of three ends with a partial
/// row; the missing cells are `None`.
#[derive(Debug, Clone, Copy)]
pub struct RegistryRow<'a> {
    pub label: ElementRef<'a>,
    pub template: Option<ElementRef<'a>>,
    pub terminator: Option<ElementRef<'a>>,
}

/// Groups a cell stream into [`RegistryRow`]s.
pub struct RowTriples<I> {
    cells: I,
}

impl<I> RowTriples<I> {
    pub fn new(cells: I) -> Self {
        Self { cells }
    }
}

impl<'a, I> Iterator for RowTriples<I>
where
    I: Iterator<Item = ElementRef<'a>>,
{
    type Item = RegistryRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.cells.next()?;
        let template = self.cells.next();
        let terminator = self.cells.next();

        if terminator.is_none() {
            debug!("registry table ends with a partial row");
        }

        Some(RegistryRow {
            label,
            template,
            terminator,
        })
    }
}

/// Tables whose id marks them as registry data.
fn data_tables(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.select(&TABLE_SEL).filter(|table| {
        table
            .value()
            .attr("id")
            .is_some_and(|id| id.starts_with(TABLE_ID_PREFIX))
    })
}

/// All rows of all data tables, in document order.
pub fn registry_rows(doc: &Html) -> impl Iterator<Item = RegistryRow<'_>> {
    data_tables(doc).flat_map(|table| RowTriples::new(table.select(&CELL_SEL)))
}

// ---------------------------------------------------------------------------
// Record building
// ---------------------------------------------------------------------------

/// Parse the registry document into records, one per row.
///
/// Rows whose template cell is empty are kept with an empty type and no
/// detail page.
pub fn parse_registry(doc: &Html, template_prefix: &Url) -> Result<Vec<Record>> {
    let tables = data_tables(doc).count();
    if tables == 0 {
        return Err(MimegenError::parse(format!(
            "registry document has no tables with an id starting with '{TABLE_ID_PREFIX}'"
        )));
    }

    let records: Vec<Record> = registry_rows(doc)
        .map(|row| build_record(&row, template_prefix))
        .collect();

    debug!(tables, rows = records.len(), "registry tables walked");

    Ok(records)
}

fn build_record(row: &RegistryRow<'_>, template_prefix: &Url) -> Record {
    let mut record = Record::new(cell_text(row.label));

    let Some(template) = row.template else {
        return record;
    };

    let value = cell_text(template);
    if value.is_empty() {
        warn!(name = %record.internal_name, "media type has no template");
        return record;
    }

    match value.split_once('/') {
        Some((type_, sub_type)) => {
            record.type_ = type_.to_string();
            record.sub_type = sub_type.to_string();
        }
        None => {
            warn!(name = %record.internal_name, template = %value, "template is not type/subtype");
            record.type_ = value;
        }
    }

    let href = template
        .select(&LINK_SEL)
        .next()
        .and_then(|a| a.value().attr("href"));

    if let Some(href) = href {
        match template_prefix.join(href) {
            Ok(url) => record.detail_ref = Some(url),
            Err(e) => {
                warn!(name = %record.internal_name, href, error = %e, "unresolvable template link");
            }
        }
    }

    record
}

/// Cell text with surrounding newlines/spaces trimmed and inner newlines removed.
fn cell_text(cell: ElementRef<'_>) -> String {
    let text: String = cell.text().collect();
    text.trim_matches(|c: char| c == '\n' || c == ' ').replace('\n', "")
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Fetch (or read) the registry document and parse it into records.
#[instrument(skip_all, fields(source = %source))]
pub async fn scrape_registry(
    client: &Client,
    source: &Source,
    template_prefix: &Url,
) -> Result<Vec<Record>> {
    let content = source.read_to_string(client).await?;

    let records = {
        let doc = Html::parse_document(&content);
        parse_registry(&doc, template_prefix)?
    };

    let linked = records.iter().filter(|r| r.detail_ref.is_some()).count();
    info!(records = records.len(), linked, "registry document parsed");

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "https://www.iana.org/assignments/media-types/";

    const REGISTRY: &str = r#"<!DOCTYPE html>
<html><body>
<table id="legend"><tr><td>not</td><td>a</td><td>registry</td></tr></table>
<table id="table-application">
  <thead><tr><th>Name</th><th>Template</th><th>Reference</th></tr></thead>
  <tbody>
    <tr>
      <td>
        Portable Document
        Format
      </td>
      <td><a href="application/pdf">application/pdf</a></td>
      <td>[RFC8118]</td>
    </tr>
    <tr>
      <td>1d-interleaved-parityfec</td>
      <td><a href="application/1d-interleaved-parityfec">application/1d-interleaved-parityfec</a></td>
      <td>[RFC6015]</td>
    </tr>
    <tr>
      <td>vnd.example-deprecated</td>
      <td></td>
      <td>[Someone]</td>
    </tr>
    <tr>
      <td>json</td>
      <td>application/json</td>
      <td>[RFC8259]</td>
    </tr>
  </tbody>
</table>
<table id="table-image">
  <tr><td>png</td><td><a href="image/png">image/png</a></td><td>[W3C]</td></tr>
</table>
</body></html>"#;

    fn prefix() -> Url {
        Url::parse(PREFIX).unwrap()
    }

    #[test]
    fn rows_come_from_data_tables_only() {
        let doc = Html::parse_document(REGISTRY);
        let labels: Vec<String> = registry_rows(&doc).map(|r| cell_text(r.label)).collect();
        assert_eq!(
            labels,
            vec![
                "Portable Document        Format",
                "1d-interleaved-parityfec",
                "vnd.example-deprecated",
                "json",
                "png"
            ]
        );
    }

    #[test]
    fn parses_records_with_links() {
        let doc = Html::parse_document(REGISTRY);
        let records = parse_registry(&doc, &prefix()).unwrap();
        assert_eq!(records.len(), 5);

        let pdf = &records[0];
        assert_eq!(pdf.type_, "application");
        assert_eq!(pdf.sub_type, "pdf");
        assert_eq!(
            pdf.detail_ref.as_ref().map(Url::as_str),
            Some("https://www.iana.org/assignments/media-types/application/pdf")
        );
        assert!(pdf.extensions.is_empty());

        let png = &records[4];
        assert_eq!(png.media_type(), "image/png");
        assert!(png.detail_ref.is_some());
    }

    #[test]
    fn empty_template_keeps_record_and_later_rows() {
        let doc = Html::parse_document(REGISTRY);
        let records = parse_registry(&doc, &prefix()).unwrap();

        let deprecated = &records[2];
        assert_eq!(deprecated.internal_name, "vnd.example-deprecated");
        assert!(!deprecated.has_template());
        assert!(deprecated.sub_type.is_empty());
        assert!(deprecated.detail_ref.is_none());

        // The row after it still parses normally.
        assert_eq!(records[3].media_type(), "application/json");
    }

    #[test]
    fn unlinked_template_has_no_detail_ref() {
        let doc = Html::parse_document(REGISTRY);
        let records = parse_registry(&doc, &prefix()).unwrap();
        assert_eq!(records[3].internal_name, "json");
        assert!(records[3].detail_ref.is_none());
    }

    #[test]
    fn partial_trailing_row_still_yields_record() {
        let html = r#"<table id="table-text">
            <tr><td>plain</td><td><a href="text/plain">text/plain</a></td><td>[RFC2046]</td></tr>
            <tr><td>css</td><td>text/css</td></tr>
        </table>"#;
        let doc = Html::parse_document(html);
        let records = parse_registry(&doc, &prefix()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].media_type(), "text/css");
    }

    #[test]
    fn template_without_slash_keeps_whole_value_as_type() {
        let html = r#"<table id="table-odd"><tr><td>odd</td><td>oddity</td><td>-</td></tr></table>"#;
        let doc = Html::parse_document(html);
        let records = parse_registry(&doc, &prefix()).unwrap();
        assert_eq!(records[0].type_, "oddity");
        assert_eq!(records[0].sub_type, "");
    }

    #[test]
    fn document_without_data_tables_is_rejected() {
        let doc = Html::parse_document("<html><body><p>Service unavailable</p></body></html>");
        let err = parse_registry(&doc, &prefix()).unwrap_err();
        assert!(matches!(err, MimegenError::Parse { .. }));
    }

    #[tokio::test]
    async fn scrape_from_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/media-types.xhtml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(REGISTRY))
            .mount(&server)
            .await;

        let client = mimegen_shared::build_client(None).unwrap();
        let source =
            Source::Remote(Url::parse(&format!("{}/media-types.xhtml", server.uri())).unwrap());
        let records = scrape_registry(&client, &source, &prefix()).await.unwrap();
        assert_eq!(records.len(), 5);
    }

    #[tokio::test]
    async fn unavailable_registry_is_fatal() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = mimegen_shared::build_client(None).unwrap();
        let source = Source::Remote(Url::parse(&server.uri()).unwrap());
        let err = scrape_registry(&client, &source, &prefix()).await.unwrap_err();
        assert!(matches!(err, MimegenError::Network(_)));
    }
}
