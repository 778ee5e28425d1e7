// =============================================================================
// providers/html.rs — TABLES OUT OF TAG SOUP
// =============================================================================
//
// Courier tracking pages put the history in a plain <table>: one header row
// inside <thead>, one <tr> per scan inside <tbody>. That is all we need, so
// instead of a full HTML parser we walk the markup with memchr's SIMD
// substring search and pull out the cells.
//
// Searches run over an ASCII-lowercased copy of the page. Lowercasing ASCII
// never changes byte offsets, so positions found in the copy slice the
// original text cleanly and cell contents keep their case.
// =============================================================================

use memchr::memmem;

/// A table reduced to header labels and rows of cell text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Index of the header whose text equals `label`, ignoring ASCII case.
    pub fn column(&self, label: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(label))
    }
}

/// Extract the first table that has both a `<thead>` and a `<tbody>`.
///
/// Returns `None` when either section is missing or the header row is
/// empty. A table with headers but no body rows is returned with no rows.
pub fn extract_table(html: &str) -> Option<Table> {
    let lower = html.to_ascii_lowercase();

    let (thead_start, thead_end) = find_element(&lower, "thead", 0)?;
    let head_row = find_element(&lower[..thead_end], "tr", thead_start)?;
    let headers = cells(html, &lower, head_row, "th");
    if headers.is_empty() {
        return None;
    }

    let (tbody_start, tbody_end) = find_element(&lower, "tbody", thead_end)?;
    let mut rows = Vec::new();
    let mut cursor = tbody_start;
    while let Some((row_start, row_end)) = find_element(&lower[..tbody_end], "tr", cursor) {
        rows.push(cells(html, &lower, (row_start, row_end), "td"));
        cursor = row_end;
    }

    Some(Table { headers, rows })
}

/// Visible text of an HTML fragment: tags removed, common entities decoded,
/// whitespace collapsed.
pub fn text_content(fragment: &str) -> String {
    let mut text = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Locate the next `<tag ...>...</tag>` at or after `from`.
/// Returns (content start, end of the closing tag).
fn find_element(lower: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let open = format!("<{}", tag);
    let close = format!("</{}", tag);
    let bytes = lower.as_bytes();

    let mut search = from;
    let open_at = loop {
        let at = search + memmem::find(&bytes[search..], open.as_bytes())?;
        // `<th` must not match `<thead`, `<tr` must not match `<track`.
        match bytes.get(at + open.len()) {
            Some(b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/') => break at,
            _ => search = at + open.len(),
        }
    };

    let content_start = open_at + memchr::memchr(b'>', &bytes[open_at..])? + 1;
    let close_at = content_start + memmem::find(&bytes[content_start..], close.as_bytes())?;
    let close_end = close_at + memchr::memchr(b'>', &bytes[close_at..])? + 1;
    Some((content_start, close_end))
}

/// Text of every `<cell_tag>` inside the element spanning `range`.
fn cells(html: &str, lower: &str, range: (usize, usize), cell_tag: &str) -> Vec<String> {
    let (start, end) = range;
    let scope = &lower[..end];
    let close = format!("</{}", cell_tag);

    let mut out = Vec::new();
    let mut cursor = start;
    while let Some((content_start, cell_end)) = find_element(scope, cell_tag, cursor) {
        let content_end = memmem::rfind(
            &scope.as_bytes()[content_start..cell_end],
            close.as_bytes(),
        )
        .map(|offset| content_start + offset)
        .unwrap_or(cell_end);
        out.push(text_content(&html[content_start..content_end]));
        cursor = cell_end;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
        <table class="history">
          <THEAD>
            <tr><th>Date</th><th class="c">City/village</th><th>Operation</th></tr>
          </THEAD>
          <tbody>
            <tr><td>12.01.2024 09:15</td><td>Sofia</td><td>Delivered &amp; signed</td></tr>
            <tr>
              <td>10.01.2024
                  14:05</td>
              <td></td>
              <td><span>Accepted</span> at office</td>
            </tr>
          </tbody>
        </table>
        </body></html>
    "#;

    #[test]
    fn test_extracts_headers_and_rows() {
        let table = extract_table(PAGE).unwrap();
        assert_eq!(table.headers, vec!["Date", "City/village", "Operation"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["12.01.2024 09:15", "Sofia", "Delivered & signed"]);
        assert_eq!(table.rows[1], vec!["10.01.2024 14:05", "", "Accepted at office"]);
    }

    #[test]
    fn test_column_lookup_ignores_case() {
        let table = extract_table(PAGE).unwrap();
        assert_eq!(table.column("city/village"), Some(1));
        assert_eq!(table.column("Weight"), None);
    }

    #[test]
    fn test_missing_sections() {
        assert!(extract_table("<p>No shipment found</p>").is_none());
        assert!(extract_table("<table><thead><tr><th>Date</th></tr></thead></table>").is_none());
    }

    #[test]
    fn test_empty_body() {
        let page = "<table><thead><tr><th>Date</th></tr></thead><tbody></tbody></table>";
        let table = extract_table(page).unwrap();
        assert_eq!(table.headers, vec!["Date"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_text_content() {
        assert_eq!(text_content("  <b>Hub</b>&nbsp;Plovdiv \n"), "Hub Plovdiv");
    }
}
