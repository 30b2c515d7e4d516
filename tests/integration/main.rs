//! Integration tests for bundler-upgraded-yet

mod support {
    use std::sync::Arc;
    use std::thread;

    /// Canned stand-in for GitHub, serving fixed bodies by path
    pub struct FakeUpstream {
        server: Arc<tiny_http::Server>,
        pub base: String,
    }

    impl FakeUpstream {
        pub fn start(routes: Vec<(String, String)>) -> Self {
            let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").unwrap());
            let addr = server.server_addr().to_ip().unwrap();
            let worker = server.clone();
            thread::spawn(move || {
                for request in worker.incoming_requests() {
                    let response = match routes.iter().find(|(path, _)| path == request.url()) {
                        Some((_, body)) => tiny_http::Response::from_string(body.clone()),
                        None => tiny_http::Response::from_string("Not Found")
                            .with_status_code(tiny_http::StatusCode(404)),
                    };
                    let _ = request.respond(response);
                }
            });
            Self {
                server,
                base: format!("http://{}", addr),
            }
        }

        /// Upstream announcing `release`, whose ruby.rb pins `bundler`
        pub fn release(release: &str, bundler: &str) -> Self {
            Self::start(vec![
                ("/releases.atom".to_string(), feed(release)),
                (
                    format!("/{}/lib/language_pack/ruby.rb", release),
                    format!("class LanguagePack::Ruby\n  BUNDLER_VERSION = \"{}\"\nend\n", bundler),
                ),
            ])
        }

        pub fn feed_url(&self) -> String {
            format!("{}/releases.atom", self.base)
        }

        pub fn source_template(&self) -> String {
            format!("{}/{{release}}/lib/language_pack/ruby.rb", self.base)
        }
    }

    impl Drop for FakeUpstream {
        fn drop(&mut self) {
            self.server.unblock();
        }
    }

    pub fn feed(release: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <id>tag:github.com,2008:https://github.com/heroku/heroku-buildpack-ruby/releases</id>
  <entry>
    <id>tag:github.com,2008:Repository/1831582/{}</id>
    <title>{}</title>
  </entry>
</feed>"#,
            release, release
        )
    }

    /// Status, content type and body of a response
    pub struct Fetched {
        pub status: u16,
        pub content_type: String,
        pub body: String,
    }

    fn agent() -> ureq::Agent {
        ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build(),
        )
    }

    fn collect(mut response: ureq::http::Response<ureq::Body>) -> Fetched {
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.body_mut().read_to_string().unwrap();
        Fetched {
            status,
            content_type,
            body,
        }
    }

    pub fn get(url: &str, accept: &str) -> Fetched {
        collect(agent().get(url).header("Accept", accept).call().unwrap())
    }

    pub fn post(url: &str) -> Fetched {
        collect(agent().post(url).send_empty().unwrap())
    }
}

mod cli_tests {
    use super::support::FakeUpstream;
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn app() -> Command {
        let mut cmd = cargo_bin_cmd!("bundler-upgraded-yet");
        cmd.env_remove("REDIS_URL")
            .env_remove("MIN_BUNDLER_VERSION")
            .env_remove("BUNDLER_UPGRADED_CONFIG");
        cmd
    }

    fn config_file(dir: &TempDir, upstream: &FakeUpstream) -> std::path::PathBuf {
        let path = dir.path().join("config.toml");
        let content = format!(
            "[upstream]\nreleases_feed_url = \"{}\"\nsource_url_template = \"{}\"\ntimeout_secs = 5\n",
            upstream.feed_url(),
            upstream.source_template()
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        app()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Has the Heroku Ruby buildpack"));
    }

    #[test]
    fn version_displays() {
        app()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("bundler-upgraded-yet"));
    }

    #[test]
    fn invalid_threshold_fails_fast() {
        app()
            .args(["check"])
            .env("MIN_BUNDLER_VERSION", "not-a-version")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn verbose_reports_config_source() {
        app()
            .args(["check", "-v"])
            .env_remove("RUST_LOG")
            .env("MIN_BUNDLER_VERSION", "not-a-version")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No config file given, using defaults"));
    }

    #[test]
    fn malformed_config_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\n").unwrap();

        app()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration at"));
    }

    #[test]
    fn check_prints_answer() {
        let upstream = FakeUpstream::release("v250", "2.3.25");
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, &upstream);

        app()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::diff("true\n"));
    }

    #[test]
    fn check_respects_env_threshold() {
        let upstream = FakeUpstream::release("v250", "2.3.25");
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, &upstream);

        app()
            .args(["check", "--config"])
            .arg(&path)
            .env("MIN_BUNDLER_VERSION", "2.4.0")
            .assert()
            .success()
            .stdout(predicate::str::diff("false\n"));
    }

    #[test]
    fn check_json_reports_release() {
        let upstream = FakeUpstream::release("v250", "2.3.25");
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, &upstream);

        app()
            .args(["check", "--json", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"release\": \"v250\""))
            .stdout(predicate::str::contains("\"bundler_version\": \"2.3.25\""));
    }

    #[test]
    fn check_fails_when_upstream_is_down() {
        let upstream = FakeUpstream::start(vec![]);
        let dir = TempDir::new().unwrap();
        let path = config_file(&dir, &upstream);

        app()
            .args(["check", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("HTTP 404"));
    }
}

mod server_tests {
    use super::support::{get, post, FakeUpstream};
    use bundler_upgraded_yet::cache::CacheLayer;
    use bundler_upgraded_yet::config::{Config, Settings};
    use bundler_upgraded_yet::server::{HttpServer, ShutdownHandle};
    use bundler_upgraded_yet::upstream::HttpFetcher;
    use bundler_upgraded_yet::web::App;
    use bundler_upgraded_yet::UpgradeEvaluator;
    use std::sync::Arc;
    use tempfile::TempDir;

    const PAGE: &str =
        "<html><body>{{ is_bundler_upgraded }}<small>{{ MIN_BUNDLER_VERSION }}</small></body></html>";

    struct Running {
        base: String,
        shutdown: ShutdownHandle,
        _template_dir: TempDir,
        _upstream: FakeUpstream,
    }

    impl Drop for Running {
        fn drop(&mut self) {
            self.shutdown.shutdown();
        }
    }

    fn start(upstream: FakeUpstream, min: &str) -> Running {
        let template_dir = TempDir::new().unwrap();
        let template = template_dir.path().join("index.html");
        std::fs::write(&template, PAGE).unwrap();

        let mut config = Config::default();
        config.upgrade.min_bundler_version = min.to_string();
        config.upstream.releases_feed_url = upstream.feed_url();
        config.upstream.source_url_template = upstream.source_template();
        config.server.template_path = template;

        let settings = Arc::new(Settings::from_config(&config).unwrap());
        let fetcher = Arc::new(HttpFetcher::new(settings.upstream_timeout));
        let evaluator = UpgradeEvaluator::new(settings, fetcher, CacheLayer::disabled());

        let server = HttpServer::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", server.local_addr().unwrap());
        let shutdown = server.shutdown_handle();
        tokio::spawn(server.run(Arc::new(App::new(evaluator)), 4));

        Running {
            base,
            shutdown,
            _template_dir: template_dir,
            _upstream: upstream,
        }
    }

    async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        tokio::task::spawn_blocking(f).await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn json_answer() {
        let running = start(FakeUpstream::release("v250", "2.3.25"), "1.16.0");
        let url = format!("{}/", running.base);

        let fetched = blocking(move || get(&url, "application/json")).await;
        assert_eq!(fetched.status, 200);
        assert!(fetched.content_type.starts_with("application/json"));

        let body: serde_json::Value = serde_json::from_str(&fetched.body).unwrap();
        assert_eq!(body["result"], serde_json::Value::Bool(true));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn html_answer_fully_substituted() {
        let running = start(FakeUpstream::release("v150", "1.9.0"), "1.16.0");
        let url = format!("{}/", running.base);

        let fetched = blocking(move || get(&url, "text/html")).await;
        assert_eq!(fetched.status, 200);
        assert!(fetched.content_type.starts_with("text/html"));
        assert!(!fetched.body.contains("{{"));
        assert!(fetched.body.contains(r#"<p class="no">"#));
        assert!(fetched.body.contains("<small>1.16.0</small>"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn xml_not_acceptable() {
        let running = start(FakeUpstream::release("v250", "2.3.25"), "1.16.0");
        let url = format!("{}/", running.base);

        let fetched = blocking(move || get(&url, "application/xml")).await;
        assert_eq!(fetched.status, 406);
        assert!(fetched.content_type.starts_with("text/plain"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn post_not_allowed() {
        let running = start(FakeUpstream::release("v250", "2.3.25"), "1.16.0");
        let url = format!("{}/", running.base);

        let fetched = blocking(move || post(&url)).await;
        assert_eq!(fetched.status, 405);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn other_path_not_found() {
        let running = start(FakeUpstream::release("v250", "2.3.25"), "1.16.0");
        let url = format!("{}/status", running.base);

        let fetched = blocking(move || get(&url, "application/json")).await;
        assert_eq!(fetched.status, 404);
        assert_eq!(fetched.body, "Root URL only");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upstream_outage_is_bad_gateway() {
        let running = start(FakeUpstream::start(vec![]), "1.16.0");
        let url = format!("{}/", running.base);

        let fetched = blocking(move || get(&url, "application/json")).await;
        assert_eq!(fetched.status, 502);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_requests_are_independent() {
        let running = start(FakeUpstream::release("v250", "2.3.25"), "1.16.0");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let url = format!("{}/", running.base);
            handles.push(tokio::task::spawn_blocking(move || get(&url, "application/json")));
        }
        for handle in handles {
            let fetched = handle.await.unwrap();
            assert_eq!(fetched.status, 200);
            assert_eq!(fetched.body, r#"{"result":true}"#);
        }
    }
}

mod cache_tests {
    use bundler_upgraded_yet::cache::{
        Cache, CacheLayer, MemoryCache, BUNDLER_VERSION_HASH, LATEST_RELEASE_KEY,
    };
    use bundler_upgraded_yet::config::{Config, Settings};
    use bundler_upgraded_yet::upstream::Fetcher;
    use bundler_upgraded_yet::{AppError, AppResult, UpgradeEvaluator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const FEED_URL: &str = "https://github.test/releases.atom";

    /// Fixed upstream that counts feed requests
    struct CountingFetcher {
        release: String,
        bundler: String,
        feed_calls: AtomicUsize,
    }

    impl CountingFetcher {
        fn new(release: &str, bundler: &str) -> Arc<Self> {
            Arc::new(Self {
                release: release.to_string(),
                bundler: bundler.to_string(),
                feed_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Fetcher for CountingFetcher {
        async fn fetch_text(&self, url: &str) -> AppResult<String> {
            if url == FEED_URL {
                self.feed_calls.fetch_add(1, Ordering::SeqCst);
                return Ok(super::support::feed(&self.release));
            }
            if url == format!("https://raw.test/{}/ruby.rb", self.release) {
                return Ok(format!("BUNDLER_VERSION = \"{}\"", self.bundler));
            }
            Err(AppError::UpstreamStatus {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Backend that is always unreachable
    struct Unreachable;

    #[async_trait]
    impl Cache for Unreachable {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Cache("Connection refused (os error 111)".into()))
        }

        async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl: u64) -> AppResult<()> {
            Err(AppError::Cache("Connection refused (os error 111)".into()))
        }

        async fn set_if_absent(&self, _g: &str, _f: &str, _v: &str) -> AppResult<bool> {
            Err(AppError::Cache("Connection refused (os error 111)".into()))
        }

        fn backend_name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn settings(min: &str) -> Arc<Settings> {
        let mut config = Config::default();
        config.upgrade.min_bundler_version = min.to_string();
        config.upstream.releases_feed_url = FEED_URL.to_string();
        config.upstream.source_url_template = "https://raw.test/{release}/ruby.rb".to_string();
        Arc::new(Settings::from_config(&config).unwrap())
    }

    fn layer(cache: Arc<dyn Cache>) -> CacheLayer {
        CacheLayer::new(cache, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn unreachable_cache_matches_populated_cache() {
        for (bundler, min) in [("2.3.25", "1.16.0"), ("1.15.2", "1.16.0"), ("1.16.0-rc.1", "1.16.0")] {
            let memory = Arc::new(MemoryCache::new());
            memory
                .set_with_ttl(LATEST_RELEASE_KEY, "v250", 3600)
                .await
                .unwrap();
            let populated = UpgradeEvaluator::new(
                settings(min),
                CountingFetcher::new("v250", bundler),
                layer(memory),
            );
            let unreachable = UpgradeEvaluator::new(
                settings(min),
                CountingFetcher::new("v250", bundler),
                layer(Arc::new(Unreachable)),
            );

            for _ in 0..2 {
                assert_eq!(
                    populated.is_bundler_upgraded().await.unwrap(),
                    unreachable.is_bundler_upgraded().await.unwrap(),
                    "bundler {} vs {}",
                    bundler,
                    min
                );
            }
        }
    }

    #[tokio::test]
    async fn cached_release_avoids_feed() {
        let memory = Arc::new(MemoryCache::new());
        memory
            .set_with_ttl(LATEST_RELEASE_KEY, "v2.0.1", 3600)
            .await
            .unwrap();
        let fetcher = CountingFetcher::new("v2.0.1", "2.0.1");
        let evaluator = UpgradeEvaluator::new(settings("1.16.0"), fetcher.clone(), layer(memory));

        let evaluation = evaluator.evaluate().await.unwrap();
        assert_eq!(evaluation.release, "v2.0.1");
        assert_eq!(fetcher.feed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_cache_always_hits_feed() {
        let fetcher = CountingFetcher::new("v250", "2.3.25");
        let evaluator = UpgradeEvaluator::new(
            settings("1.16.0"),
            fetcher.clone(),
            layer(Arc::new(Unreachable)),
        );

        evaluator.is_bundler_upgraded().await.unwrap();
        evaluator.is_bundler_upgraded().await.unwrap();
        assert_eq!(fetcher.feed_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn recorded_version_is_write_once() {
        let memory = Arc::new(MemoryCache::new());
        let cache = layer(memory.clone());

        assert!(cache.set_if_absent(BUNDLER_VERSION_HASH, "v250", "1.0.0").await);
        assert!(!cache.set_if_absent(BUNDLER_VERSION_HASH, "v250", "2.0.0").await);
        assert_eq!(memory.field(BUNDLER_VERSION_HASH, "v250").as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn evaluation_does_not_overwrite_recorded_version() {
        let memory = Arc::new(MemoryCache::new());
        memory
            .set_if_absent(BUNDLER_VERSION_HASH, "v250", "1.0.0")
            .await
            .unwrap();
        let evaluator = UpgradeEvaluator::new(
            settings("1.16.0"),
            CountingFetcher::new("v250", "2.3.25"),
            layer(memory.clone()),
        );

        assert!(evaluator.is_bundler_upgraded().await.unwrap());
        assert_eq!(memory.field(BUNDLER_VERSION_HASH, "v250").as_deref(), Some("1.0.0"));
    }
}

mod env_tests {
    use bundler_upgraded_yet::cli::{load_config, Cli};
    use clap::Parser;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    async fn environment_overrides_defaults() {
        std::env::set_var("MIN_BUNDLER_VERSION", "2.1.0");
        std::env::set_var("REDIS_URL", "redis://cache.internal:6379");
        std::env::set_var("PORT", "5123");

        let cli = Cli::try_parse_from(["bundler-upgraded-yet"]).unwrap();
        let config = load_config(&cli).await.unwrap();

        std::env::remove_var("MIN_BUNDLER_VERSION");
        std::env::remove_var("REDIS_URL");
        std::env::remove_var("PORT");

        assert_eq!(config.upgrade.min_bundler_version, "2.1.0");
        assert_eq!(config.cache.redis_url.as_deref(), Some("redis://cache.internal:6379"));
        assert_eq!(config.server.port, 5123);
    }

    #[tokio::test]
    #[serial]
    async fn defaults_without_environment() {
        std::env::remove_var("MIN_BUNDLER_VERSION");
        std::env::remove_var("REDIS_URL");
        std::env::remove_var("PORT");
        std::env::remove_var("BUNDLER_UPGRADED_CONFIG");

        let cli = Cli::try_parse_from(["bundler-upgraded-yet"]).unwrap();
        let config = load_config(&cli).await.unwrap();

        assert_eq!(config.upgrade.min_bundler_version, "1.16.0");
        assert!(config.cache.redis_url.is_none());
        assert_eq!(config.server.port, 9000);
    }
}
