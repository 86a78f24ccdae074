//! Home page rendering.

use crate::client::FactClient;
use std::fmt;
use structured_logger::{Attributes, MetricTags};

/// Page heading.
pub const HEADING: &str = "Cat Fact of the Moment";

/// Hint shown under the heading.
pub const SUBTITLE: &str = "Refresh the page for a new fact";

/// Rendered home page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomePage {
    /// The fact or fallback text shown on the page
    pub fact: String,
}

impl fmt::Display for HomePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADING}")?;
        writeln!(f, "{SUBTITLE}")?;
        writeln!(f)?;
        write!(f, "{}", self.fact)
    }
}

fn home_tags() -> MetricTags {
    MetricTags::from([("page".to_string(), "home".to_string())])
}

/// Render the home page with one freshly fetched fact.
///
/// Fetch failures render the fallback text; rendering itself never fails.
pub async fn render_home(client: &FactClient) -> HomePage {
    let logger = client.logger();

    logger.info("Rendering cat facts home page", None);
    logger.increment("page.views", Some(home_tags()));

    let fact = client.fetch_fact_or_fallback().await;

    logger.info(
        "Page render complete",
        Some(Attributes::new().with("fact_length", fact.chars().count())),
    );
    logger.increment("page.renders.success", Some(home_tags()));

    HomePage { fact }
}
