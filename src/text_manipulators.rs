use scraper::ElementRef;

pub fn extract_href<'a>(node: ElementRef<'a>) -> Option<&'a str> {
    node.value().attr("href").map(str::trim)
}

/// Final path segment of a link, without query string or fragment.
pub fn file_name_from_link(link: &str) -> Option<&str> {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
