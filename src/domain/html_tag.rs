use scraper::{ElementRef, Html, Selector};

use super::error::BrowserError;

/// Owned snapshot of one element matched on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub tag: String,
    pub text: String,
    pub inner_html: String,
    attrs: Vec<(String, String)>,
}

impl Node {
    fn from_element(element: ElementRef<'_>) -> Self {
        Node {
            tag: element.value().name().to_string(),
            text: squash(element.text()),
            inner_html: element.inner_html(),
            attrs: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The node's own `href` when it is a link, otherwise the first link inside it.
    pub fn first_link(&self) -> Option<String> {
        if self.tag == "a" {
            return self.attr("href").map(|href| href.to_string());
        }

        let link = Selector::parse("a[href]").ok()?;
        let fragment = Html::parse_fragment(&self.inner_html);
        let href = fragment
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| href.to_string());
        href
    }
}

fn squash<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(|part| part.split_whitespace())
        .collect::<Vec<&str>>()
        .join(" ")
}

fn parse_selector(css: &str) -> Result<Selector, BrowserError> {
    Selector::parse(css).map_err(|e| BrowserError::Driver(format!("bad selector `{}`: {:?}", css, e)))
}

pub fn select_nodes(html: &str, css: &str) -> Result<Vec<Node>, BrowserError> {
    let selector = parse_selector(css)?;
    let document = Html::parse_document(html);

    Ok(document.select(&selector).map(Node::from_element).collect())
}

/// Value cell next to the first header containing `label`, for `th`/`td` tables
/// and `dt`/`dd` lists alike.
fn value_for_label(document: &Html, label: &str) -> Option<String> {
    let headers = Selector::parse("th, dt").ok()?;

    document
        .select(&headers)
        .filter(|header| header.text().collect::<String>().contains(label))
        .find_map(|header| {
            header
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| matches!(sibling.value().name(), "td" | "dd"))
                .map(|cell| squash(cell.text()))
        })
}

/// Walks the label chain in order and returns the first labelled value found.
/// An empty string means no label in the chain is present on the page.
pub fn lookup_field(html: &str, labels: &[String]) -> String {
    let document = Html::parse_document(html);

    labels
        .iter()
        .find_map(|label| value_for_label(&document, label))
        .unwrap_or_default()
}

/// First link whose text contains one of `tabs`, tried in the order given.
pub fn find_tab_link(html: &str, tabs: &[String]) -> Option<String> {
    let nodes = select_nodes(html, "a[href]").ok()?;

    tabs.iter().find_map(|tab| {
        let tab = tab.to_lowercase();
        nodes
            .iter()
            .find(|node| node.text.to_lowercase().contains(&tab))
            .and_then(|node| node.attr("href").map(|href| href.to_string()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAILS: &str = r#"
        <html><body>
          <table id="simpleDetailsTable">
            <tr><th>Reference</th><td>25/01234/FULL</td></tr>
            <tr><th>Site Address</th><td> 12 Oxford Street
                London W1 </td></tr>
            <tr><th>Proposal</th><td>Change of use to retail (Class E)</td></tr>
            <tr><th>Decision</th><td>Refused</td></tr>
            <tr><th>Status</th><td>Decided</td></tr>
          </table>
          <a href="applicationDetails.do?activeTab=summary">Summary</a>
          <a href="applicationDetails.do?activeTab=contacts">Contacts</a>
          <a href="applicationDetails.do?activeTab=details">Further Information</a>
        </body></html>
    "#;

    fn chain(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn first_matching_label_wins() {
        assert_eq!(lookup_field(DETAILS, &chain(&["Status", "Decision"])), "Decided");
        assert_eq!(lookup_field(DETAILS, &chain(&["Decision", "Status"])), "Refused");
    }

    #[test]
    fn later_labels_are_fallbacks() {
        assert_eq!(
            lookup_field(DETAILS, &chain(&["Description", "Proposal"])),
            "Change of use to retail (Class E)"
        );
        assert_eq!(
            lookup_field(DETAILS, &chain(&["Address", "Site Address"])),
            "12 Oxford Street London W1"
        );
    }

    #[test]
    fn missing_chain_is_empty() {
        assert_eq!(lookup_field(DETAILS, &chain(&["Agent Name", "Agent Company"])), "");
        assert_eq!(lookup_field(DETAILS, &[]), "");
    }

    #[test]
    fn definition_lists_are_understood() {
        let html = "<dl><dt>Status</dt><dd>Pending</dd><dt>Proposal</dt><dd>Shop front</dd></dl>";

        assert_eq!(lookup_field(html, &chain(&["Status"])), "Pending");
        assert_eq!(lookup_field(html, &chain(&["Proposal"])), "Shop front");
    }

    #[test]
    fn tab_order_decides_between_contacts_and_further_information() {
        assert_eq!(
            find_tab_link(DETAILS, &chain(&["Contacts", "Further Information"])).as_deref(),
            Some("applicationDetails.do?activeTab=contacts")
        );
        assert_eq!(
            find_tab_link(DETAILS, &chain(&["Further Information", "Contacts"])).as_deref(),
            Some("applicationDetails.do?activeTab=details")
        );
        assert_eq!(find_tab_link(DETAILS, &chain(&["Documents"])), None);
    }

    #[test]
    fn nodes_expose_text_attributes_and_links() {
        let html = r#"
            <ul id="searchresults">
              <li class="searchresult"><a href="/app/1">Retail   unit</a><p>Ref 1</p></li>
              <li class="searchresult"><p>No link here</p></li>
            </ul>
            <select id="week"><option value="Oct 6, 2025">6 Oct 2025</option></select>
        "#;

        let entries = select_nodes(html, ".searchresult").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "Retail unit Ref 1");
        assert_eq!(entries[0].first_link().as_deref(), Some("/app/1"));
        assert_eq!(entries[1].first_link(), None);

        let options = select_nodes(html, "#week option").unwrap();
        assert_eq!(options[0].attr("value"), Some("Oct 6, 2025"));
        assert_eq!(options[0].text, "6 Oct 2025");
    }

    #[test]
    fn invalid_selector_is_an_error() {
        assert!(select_nodes("<p></p>", "p[[").is_err());
    }
}
