use crate::app_env::test::TEST_DB_URL;
use crate::persistence;
use crate::security::token_driven_ports::JwtSessionTokens;
use crate::{SharedData, build_router};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use dotenv::dotenv;
use lazy_static::lazy_static;
use rand::{Rng, thread_rng};
use serde_json::Value;
use sqlx::{Connection, PgConnection, PgPool};
use std::env;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tower::ServiceExt;

lazy_static! {
    static ref TOKIO_RT: Runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Tokio runtime failed to initialize");
}

struct TestDatabase {
    db_name: String,
}

impl TestDatabase {
    async fn create(base_url: &str) -> Result<Self, sqlx::Error> {
        let schema_id: u32 = thread_rng().gen_range(10_000..99_999);
        let db_name = format!("workboard_test_{schema_id}");
        let mut conn = PgConnection::connect(base_url).await?;

        sqlx::query(format!("CREATE DATABASE {db_name}").as_str())
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        Ok(Self { db_name })
    }

    async fn drop_database(self, base_url: &str) {
        let dropped = async {
            let mut conn = PgConnection::connect(base_url).await?;
            sqlx::query(format!("DROP DATABASE IF EXISTS {} WITH (FORCE)", self.db_name).as_str())
                .execute(&mut conn)
                .await?;
            conn.close().await
        }
        .await;

        if let Err(error) = dropped {
            println!(
                "Warning: failed to drop test database {}, you may need to do it manually. Error: {error}",
                self.db_name
            );
        }
    }
}

/// Creates a fresh, migrated database for a test and drops it once the test finishes.
///
/// Expects that the TEST_DB_URL environment variable is populated with a connection string
/// that has no database name on the end.
pub fn prepare_db_and_test<F, R>(test_fn: F)
where
    R: Future<Output = ()>,
    F: FnOnce(PgPool) -> R,
{
    if dotenv().is_err() {
        println!("Test is running without .env file.");
    }

    TOKIO_RT.block_on(async move {
        let base_url = env::var(TEST_DB_URL).unwrap_or_else(|_| {
            panic!("You must provide the {TEST_DB_URL} environment variable as the base postgres connection string")
        });
        let test_db = TestDatabase::create(&base_url)
            .await
            .unwrap_or_else(|err| panic!("Failed to create test database: {err}"));

        let pool = persistence::connect_sqlx(&format!("{base_url}/{}", test_db.db_name))
            .await
            .expect("could not connect to the test database");
        persistence::run_migrations(&pool)
            .await
            .expect("could not migrate the test database");

        test_fn(pool.clone()).await;

        pool.close().await;
        test_db.drop_database(&base_url).await;
    });
}

/// Builds the full application router on top of a test database
pub fn app_for(db: PgPool) -> Router {
    build_router(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db),
        session_tokens: JwtSessionTokens::new("integration-test-secret"),
    }))
}

/// Sends a request through the router, returning the status and parsed JSON body
pub async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("request should build");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should always produce a response");
    let status = response.status();

    (
        status,
        crate::api::test_util::deserialize_body(response.into_body()).await,
    )
}
