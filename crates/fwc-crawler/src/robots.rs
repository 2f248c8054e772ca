use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use texting_robots::Robot;
use tokio::sync::OnceCell;
use url::Url;

use crate::fetch::{Fetch, Method};

/// `error` of records refused by the robots rules.
pub const ROBOTS_DISALLOW: &str = "robots_disallow";

enum Rules {
    AllowAll,
    DisallowAll,
    Parsed(Robot),
}

impl Rules {
    fn allowed(&self, url: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::DisallowAll => false,
            Self::Parsed(robot) => robot.allowed(url),
        }
    }
}

/// Per-host cache of robots rules, shared by every worker of a run.
///
/// The rules of a host are fetched once, on its first reference. When that fetch
/// fails at the transport level the host is treated as fully allowed (fail-open).
/// A 401/403 answer disallows the whole host, any other non-2xx answer allows it.
pub struct RobotsGate {
    fetcher: Arc<dyn Fetch>,
    user_agent: String,
    hosts: Mutex<HashMap<String, Arc<OnceCell<Rules>>>>,
}

impl RobotsGate {
    pub fn new(fetcher: Arc<dyn Fetch>, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        Self {
            fetcher,
            user_agent: product_token(&user_agent).to_string(),
            hosts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn allowed(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("No robots check for {url} got: {e}");
                return true;
            }
        };
        let origin = parsed.origin().ascii_serialization();

        let cell = {
            let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
            hosts.entry(origin.clone()).or_default().clone()
        };
        let rules = cell.get_or_init(|| self.load(&origin)).await;

        rules.allowed(url)
    }

    /// Number of hosts whose rules have been requested so far.
    pub fn cached_hosts(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn load(&self, origin: &str) -> Rules {
        let robots_url = format!("{origin}/robots.txt");
        let res = self.fetcher.fetch(&robots_url, Method::Get).await;

        match (res.status, &res.error) {
            (_, Some(e)) => {
                log::warn!("Couldn't fetch {robots_url}, allowing host: {e}");
                Rules::AllowAll
            }
            (Some(401) | Some(403), None) => {
                log::info!("Robots access denied for {origin}, host disallowed");
                Rules::DisallowAll
            }
            (Some(status), None) if (200..300).contains(&status) => {
                let txt = res.body.unwrap_or_default();
                match Robot::new(&self.user_agent, &txt) {
                    Ok(robot) => Rules::Parsed(robot),
                    Err(e) => {
                        log::warn!("Couldn't parse {robots_url}, allowing host: {e}");
                        Rules::AllowAll
                    }
                }
            }
            _ => Rules::AllowAll,
        }
    }
}

// Groups name the product only, `fwc/0.1 (+contact)` matches `User-agent: fwc`
fn product_token(user_agent: &str) -> &str {
    user_agent
        .trim()
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or_default()
}
