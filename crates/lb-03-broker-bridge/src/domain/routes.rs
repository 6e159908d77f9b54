//! Prefix routing table for broker fan-out.

use parking_lot::RwLock;
use shared_types::Route;

/// Ordered set of prefix-to-topic rules.
///
/// Selection picks the enabled route with the longest case-insensitive
/// prefix match; equal-length ties go to the first-registered route. The
/// table is read-mostly and hot-swappable: a `replace` is visible to the
/// next selection without restarting the sink.
pub struct RouteTable {
    routes: RwLock<Vec<Route>>,
}

impl RouteTable {
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes: RwLock::new(routes),
        }
    }

    /// Swap in a new rule set.
    pub fn replace(&self, routes: Vec<Route>) {
        *self.routes.write() = routes;
    }

    /// Number of registered rules, enabled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Select the target topic for a message, if any rule matches.
    #[must_use]
    pub fn select(&self, message: &str) -> Option<String> {
        let routes = self.routes.read();
        let mut best: Option<&Route> = None;

        for route in routes.iter() {
            if !route.enabled || !starts_with_ignore_case(message, &route.prefix) {
                continue;
            }
            // Strictly-greater comparison keeps the first registered route
            // on equal-length ties.
            match best {
                Some(current) if route.prefix.chars().count() <= current.prefix.chars().count() => {}
                _ => best = Some(route),
            }
        }

        best.map(|route| route.topic.clone())
    }
}

/// Case-insensitive prefix test that is safe on multi-byte text.
fn starts_with_ignore_case(message: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    let mut chars = message.chars();
    for expected in prefix.chars() {
        match chars.next() {
            Some(actual) if actual.to_lowercase().eq(expected.to_lowercase()) => {}
            _ => return false,
        }
    }
    true
}
