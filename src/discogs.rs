//! Retrieval of a user's collection from the Discogs API.
//!
//! The collection is listed through folder `0` ("all releases") and walked page
//! by page, strictly in order. Any failure aborts the whole fetch.
use crate::error::{Error, Result};
use crate::record::Record;
use log::{error, info};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

pub static BASE_URL: Lazy<Url> = Lazy::new(|| Url::parse("https://api.discogs.com").unwrap());

pub const PER_PAGE: u32 = 100;

/// One GET against the listing endpoint.
#[derive(Clone, PartialEq)]
pub struct PageRequest {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
}

impl PageRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<_> = self
            .headers
            .iter()
            .map(|(key, value)| {
                if key.eq_ignore_ascii_case("Authorization") {
                    (*key, "<redacted>")
                } else {
                    (*key, value.as_str())
                }
            })
            .collect();
        f.debug_struct("PageRequest")
            .field("url", &self.url.as_str())
            .field("headers", &headers)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

pub trait Transport {
    fn get(&self, request: &PageRequest) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, request: &PageRequest) -> Result<Response> {
        (**self).get(request)
    }
}

/// Blocking HTTP via attohttpc.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    pub timeout: Duration,
}

impl Default for HttpTransport {
    fn default() -> Self {
        HttpTransport {
            timeout: Duration::from_secs(30),
        }
    }
}

impl Transport for HttpTransport {
    fn get(&self, request: &PageRequest) -> Result<Response> {
        let transport = |e: attohttpc::Error| Error::Transport {
            url: request.url.to_string(),
            source: Box::new(e),
        };

        let mut builder = attohttpc::get(request.url.as_str()).timeout(self.timeout);
        for (name, value) in &request.headers {
            builder = builder.try_header(*name, value.as_str()).map_err(transport)?;
        }

        let response = builder.send().map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(transport)?;

        Ok(Response { status, body })
    }
}

#[derive(Deserialize)]
struct Pagination {
    pages: u32,
    #[serde(default)]
    items: u64,
}

#[derive(Deserialize)]
struct Release {
    basic_information: Record,
}

#[derive(Deserialize)]
struct Page {
    pagination: Pagination,
    releases: Vec<Release>,
}

fn parse_page(body: &str, page: u32) -> Result<Page> {
    let mut de = serde_json::Deserializer::from_str(body);
    let parsed: Page = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        Error::UpstreamSchema {
            page,
            path: e.path().to_string(),
            message: e.into_inner().to_string(),
        }
    })?;
    // a truncated or concatenated body is malformed too
    de.end().map_err(|e| Error::UpstreamSchema {
        page,
        path: ".".into(),
        message: e.to_string(),
    })?;
    Ok(parsed)
}

pub struct CollectionClient<T = HttpTransport> {
    transport: T,
    base_url: Url,
    user_agent: String,
    token: Option<String>,
}

impl<T> fmt::Debug for CollectionClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionClient")
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl CollectionClient<HttpTransport> {
    pub fn new(user_agent: impl Into<String>, token: Option<String>) -> Self {
        Self::with_transport(HttpTransport::default(), user_agent, token)
    }
}

impl<T: Transport> CollectionClient<T> {
    pub fn with_transport(transport: T, user_agent: impl Into<String>, token: Option<String>) -> Self {
        CollectionClient {
            transport,
            base_url: BASE_URL.clone(),
            user_agent: user_agent.into(),
            token,
        }
    }

    /// Point the client at a Discogs mirror instead of `api.discogs.com`.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn endpoint(&self, user_name: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::ConfigMissing("a base URL that can carry a path"))?
            .pop_if_empty()
            .extend(&[
                "users",
                user_name,
                "collection",
                "folders",
                "0",
                "releases",
            ]);
        Ok(url)
    }

    pub fn request(&self, user_name: &str, page: u32) -> Result<PageRequest> {
        let mut url = self.endpoint(user_name)?;
        url.query_pairs_mut()
            .append_pair("page", page.to_string().as_str())
            .append_pair("per_page", PER_PAGE.to_string().as_str())
            .append_pair("sort", "artist")
            .append_pair("sort_order", "asc");

        let mut headers = vec![("User-Agent", self.user_agent.clone())];
        // without a token Discogs leaves out the image URLs
        if let Some(token) = &self.token {
            headers.push(("Authorization", format!("Discogs token={}", token)));
        }

        Ok(PageRequest { url, headers })
    }

    /// Fetch every release in the user's collection, in upstream order.
    pub fn fetch(&self, user_name: &str) -> Result<Vec<Record>> {
        if user_name.is_empty() {
            return Err(Error::ConfigMissing("user_name"));
        }
        if self.user_agent.is_empty() {
            return Err(Error::ConfigMissing("USER_AGENT"));
        }

        info!("Retrieving collection of Discogs user {}", user_name);
        info!("Endpoint: {}", self.endpoint(user_name)?);

        let mut records = Vec::new();
        let mut total = 1;
        let mut current = 1;
        let mut items = 0;

        while current <= total {
            let request = self.request(user_name, current)?;
            let response = self.transport.get(&request)?;

            if response.status != 200 {
                error!("Request failed with status code {}", response.status);
                return Err(Error::UpstreamStatus {
                    status: response.status,
                    page: current,
                });
            }

            let page = parse_page(&response.body, current)?;
            total = page.pagination.pages;
            items = page.pagination.items;
            info!("Request succeeded. Retrieved page {} of {}.", current, total);

            records.extend(page.releases.into_iter().map(|x| x.basic_information));
            current += 1;
        }

        info!("Retrieved {} records", items);
        Ok(records)
    }
}

/// Fetch `user_name`'s collection over HTTP.
pub fn fetch(user_name: &str, user_agent: &str, credential: Option<&str>) -> Result<Vec<Record>> {
    CollectionClient::new(user_agent, credential.map(String::from)).fetch(user_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<Response>>,
        requests: RefCell<Vec<PageRequest>>,
    }

    impl Scripted {
        fn new(responses: Vec<(u16, String)>) -> Self {
            Scripted {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|(status, body)| Response { status, body })
                        .collect(),
                ),
                requests: RefCell::default(),
            }
        }

        fn pages(&self) -> Vec<String> {
            self.requests
                .borrow()
                .iter()
                .map(|r| {
                    r.url
                        .query_pairs()
                        .find(|(k, _)| k == "page")
                        .map(|(_, v)| v.into_owned())
                        .unwrap()
                })
                .collect()
        }
    }

    impl Transport for Scripted {
        fn get(&self, request: &PageRequest) -> Result<Response> {
            self.requests.borrow_mut().push(request.clone());
            Ok(self
                .responses
                .borrow_mut()
                .pop_front()
                .expect("unexpected request"))
        }
    }

    fn release(id: u64, title: &str) -> Value {
        json!({
            "id": id,
            "instance_id": id * 10,
            "basic_information": {
                "id": id,
                "master_id": 0,
                "master_url": null,
                "resource_url": format!("https://api.discogs.com/releases/{}", id),
                "thumb": "",
                "cover_image": "",
                "title": title,
                "year": 2000,
                "formats": [{"name": "CD"}],
                "artists": [{"name": "Various"}],
                "labels": [{"name": "X"}],
                "genres": [],
                "styles": []
            }
        })
    }

    fn page(pages: u32, items: u64, releases: Vec<Value>) -> (u16, String) {
        let body = json!({
            "pagination": {"page": 1, "pages": pages, "per_page": 100, "items": items},
            "releases": releases,
        });
        (200, body.to_string())
    }

    #[test]
    fn request_shape() {
        let client =
            CollectionClient::with_transport(Scripted::default(), "discogs-md/0.1", Some("s3cr3t".into()));
        let request = client.request("some user", 3).unwrap();
        assert_eq!(
            request.url.as_str(),
            "https://api.discogs.com/users/some%20user/collection/folders/0/releases?page=3&per_page=100&sort=artist&sort_order=asc"
        );
        assert_eq!(request.header("user-agent"), Some("discogs-md/0.1"));
        assert_eq!(request.header("Authorization"), Some("Discogs token=s3cr3t"));
    }

    #[test]
    fn no_token_no_authorization() {
        let client = CollectionClient::with_transport(Scripted::default(), "ua", None);
        let request = client.request("u", 1).unwrap();
        assert_eq!(request.header("Authorization"), None);
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn token_is_not_printed() {
        let client = CollectionClient::with_transport(Scripted::default(), "ua", Some("s3cr3t".into()));
        assert!(!format!("{:?}", client).contains("s3cr3t"));
        let request = client.request("u", 1).unwrap();
        assert!(!format!("{:?}", request).contains("s3cr3t"));
    }

    #[test]
    fn walks_all_pages_in_order() {
        let first: Vec<_> = (0..100).map(|i| release(i, &format!("a{}", i))).collect();
        let second: Vec<_> = (100..137).map(|i| release(i, &format!("b{}", i))).collect();
        let transport = Scripted::new(vec![page(2, 137, first), page(2, 137, second)]);

        let records = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap();

        assert_eq!(transport.pages(), vec!["1", "2"]);
        assert_eq!(records.len(), 137);
        assert!(records.iter().map(|r| r.id).eq(0..137));
    }

    #[test]
    fn page_count_is_revised() {
        let transport = Scripted::new(vec![
            page(2, 3, vec![release(1, "a")]),
            page(3, 3, vec![release(2, "b")]),
            page(3, 3, vec![release(3, "c")]),
        ]);
        let records = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap();
        assert_eq!(transport.pages(), vec!["1", "2", "3"]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn empty_collection() {
        let transport = Scripted::new(vec![page(0, 0, vec![])]);
        let records = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap();
        assert!(records.is_empty());
        assert_eq!(transport.pages(), vec!["1"]);
    }

    #[test]
    fn non_200_aborts() {
        let transport = Scripted::new(vec![
            page(2, 2, vec![release(1, "a")]),
            (429, "{\"message\": \"You are making requests too quickly.\"}".into()),
        ]);
        let err = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap_err();
        match err {
            Error::UpstreamStatus { status, page } => {
                assert_eq!(status, 429);
                assert_eq!(page, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn malformed_release() {
        let mut broken = release(1, "a");
        broken["basic_information"]
            .as_object_mut()
            .unwrap()
            .remove("year");
        let transport = Scripted::new(vec![page(1, 1, vec![broken])]);
        let err = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap_err();
        match err {
            Error::UpstreamSchema { page, path, .. } => {
                assert_eq!(page, 1);
                assert!(path.starts_with("releases[0].basic_information"), "{}", path);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn missing_pagination() {
        let transport = Scripted::new(vec![(200, "{\"releases\": []}".into())]);
        let err = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamSchema { .. }));
    }

    #[test]
    fn missing_config_sends_nothing() {
        let transport = Scripted::default();
        let err = CollectionClient::with_transport(&transport, "", None)
            .fetch("user")
            .unwrap_err();
        assert!(matches!(err, Error::ConfigMissing("USER_AGENT")));

        let err = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("")
            .unwrap_err();
        assert!(matches!(err, Error::ConfigMissing("user_name")));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn custom_base_url() {
        let client = CollectionClient::with_transport(Scripted::default(), "ua", None)
            .with_base_url(Url::parse("http://localhost:8080/discogs/").unwrap());
        assert_eq!(
            client.endpoint("u").unwrap().as_str(),
            "http://localhost:8080/discogs/users/u/collection/folders/0/releases"
        );
    }

    #[test]
    fn trailing_garbage() {
        let transport = Scripted::new(vec![(
            200,
            "{\"pagination\": {\"pages\": 1}, \"releases\": []} garbage".into(),
        )]);
        let err = CollectionClient::with_transport(&transport, "ua", None)
            .fetch("user")
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamSchema { page: 1, .. }));
    }

    #[test]
    fn unreachable_host() {
        // nothing listens on port 1
        let err = CollectionClient::new("ua", Some("s3cr3t".into()))
            .with_base_url(Url::parse("http://127.0.0.1:1/").unwrap())
            .fetch("u")
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        let message = err.to_string();
        assert!(message.starts_with("request to http://127.0.0.1:1/users/u/"), "{}", message);
        assert!(!message.contains("s3cr3t"));
    }
}
