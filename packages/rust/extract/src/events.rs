//! Events page: years offered by the event-year navigation.

use bandmeta_shared::{BandMetaError, Result};

use crate::PageExtractor;
use crate::matcher::{Rule, is_tag, match_tag};
use crate::tokens::{Event, TokenStream};

const YEAR_NAV: &[Rule<()>] = &[Rule::attr(
    (),
    "nav",
    "aria-label",
    &["Event Year Navigation"],
)];

const YEAR_LINK: &[Rule<()>] = &[Rule::attr((), "a", "class", &["secondary-nav-item-link"])];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InYearNav,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EventYearsExtractor;

impl PageExtractor for EventYearsExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "event-years"
    }

    fn extract(&self, stream: &mut TokenStream) -> Result<Vec<String>> {
        let mut years = Vec::new();
        let mut state = State::Idle;

        while let Some(event) = stream.next() {
            match (state, event) {
                (_, Event::Error(msg)) => {
                    return Err(BandMetaError::parse(format!("event years: {msg}")));
                }
                (State::Idle, Event::Start(tag)) if match_tag(&tag, YEAR_NAV).is_some() => {
                    state = State::InYearNav;
                }
                (State::InYearNav, Event::Start(tag)) if match_tag(&tag, YEAR_LINK).is_some() => {
                    if let Some(text) = stream.next_text() {
                        let year = text.trim();
                        if !year.is_empty() {
                            years.push(year.to_string());
                        }
                    }
                }
                (State::InYearNav, Event::End(tag)) if is_tag(&tag, "nav") => break,
                _ => {}
            }
        }

        Ok(years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_fixture() {
        let html =
            std::fs::read_to_string("../../../fixtures/html/events.html").expect("read fixture");
        let years = EventYearsExtractor
            .extract(&mut TokenStream::from_html(&html))
            .unwrap();
        assert_eq!(years, vec!["Upcoming", "2024", "2023", "2017"]);
    }

    #[test]
    fn no_navigation_means_no_years() {
        let years = EventYearsExtractor
            .extract(&mut TokenStream::from_html(
                r#"<a class="secondary-nav-item-link">2020</a>"#,
            ))
            .unwrap();
        assert!(years.is_empty());
    }

    #[test]
    fn trims_and_skips_empty_links_then_stops_at_nav_close() {
        let html = concat!(
            r#"<nav aria-label="Event Year Navigation" class="secondary-nav">"#,
            r#"<a class="secondary-nav-item-link"> 2019 </a>"#,
            r#"<a class="secondary-nav-item-link">   </a>"#,
            r#"<a class="secondary-nav-item-link"><span>icon</span></a>"#,
            r#"<a class="other-link">1999</a>"#,
            r#"<a class="secondary-nav-item-link">2018</a>"#,
            "</nav>",
            r#"<nav aria-label="Event Year Navigation"><a class="secondary-nav-item-link">2001</a></nav>"#,
        );
        let years = EventYearsExtractor
            .extract(&mut TokenStream::from_html(html))
            .unwrap();
        assert_eq!(years, vec!["2019", "2018"]);
    }

    #[test]
    fn error_inside_navigation_fails() {
        let mut body = br#"<nav aria-label="Event Year Navigation"><a class="secondary-nav-item-link">2020</a>"#.to_vec();
        body.push(0xff);
        let err = EventYearsExtractor
            .extract(&mut TokenStream::from_bytes(&body))
            .unwrap_err();
        assert!(matches!(err, BandMetaError::Parse { .. }));
    }
}
