use nomisma::AppCommand;
use serde_json::json;
use std::fs;
use tempfile::{NamedTempFile, TempDir};
use tracing::info;
use wiremock::matchers::{bearer_token, body_json, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_PATH: &str = "/v1/projects/demo/databases/(default)/documents/users/uid-1";

// Config files, canned Firebase payloads and mock mounts shared by the tests.
mod test_utils {
    use super::*;

    pub fn write_config(content: &str) -> NamedTempFile {
        let config_file = NamedTempFile::new().expect("Failed to create temp file");
        fs::write(config_file.path(), content).expect("Failed to write config file");
        config_file
    }

    pub fn rates_config(server: &MockServer) -> NamedTempFile {
        write_config(&format!(
            r#"
            currency: "TRY"
            watchlist: ["USD", "EUR"]
            providers:
              frankfurter:
                base_url: {}
                timeout_secs: 2
        "#,
            server.uri()
        ))
    }

    pub fn account_config(server: &MockServer, data_dir: &TempDir) -> NamedTempFile {
        write_config(&format!(
            r#"
            currency: "TRY"
            data_path: "{}"
            providers:
              firebase:
                api_key: "test-key"
                project_id: "demo"
                auth_base_url: {uri}
                firestore_base_url: {uri}
        "#,
            data_dir.path().display(),
            uri = server.uri()
        ))
    }

    pub fn auth_body(id_token: &str) -> serde_json::Value {
        json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "idToken": id_token,
            "refreshToken": "refresh",
            "expiresIn": "3600"
        })
    }

    pub async fn mount_sign_in(server: &MockServer, password: &str, id_token: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": password,
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body(id_token)))
            .mount(server)
            .await;
    }
}

async fn run(command: AppCommand, config: &NamedTempFile) -> anyhow::Result<()> {
    nomisma::run_command(command, Some(config.path().to_str().unwrap())).await
}

fn login(password: &str) -> AppCommand {
    AppCommand::Login {
        email: "ada@example.com".to_string(),
        password: Some(password.to_string()),
    }
}

#[test_log::test(tokio::test)]
async fn test_rates_flow_with_mock() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("from", "TRY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": 1.0,
            "base": "TRY",
            "date": "2025-03-14",
            "rates": { "EUR": 0.0250, "GBP": 0.0210, "USD": 0.0270 }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/\d{4}-\d{2}-\d{2}$"))
        .and(query_param("from", "TRY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": 1.0,
            "base": "TRY",
            "date": "2025-03-13",
            "rates": { "EUR": 0.0252, "GBP": 0.0211, "USD": 0.0268 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_utils::rates_config(&server);
    let result = run(
        AppCommand::Rates {
            base: None,
            all: false,
            trading_days: false,
        },
        &config,
    )
    .await;
    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_rates_survive_missing_previous_day() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base": "TRY",
            "date": "2025-03-14",
            "rates": { "USD": 0.0270 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/\d{4}-\d{2}-\d{2}$"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_utils::rates_config(&server);
    let result = run(
        AppCommand::Rates {
            base: None,
            all: true,
            trading_days: false,
        },
        &config,
    )
    .await;
    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_rates_with_upstream_down_is_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = test_utils::rates_config(&server);
    let result = run(
        AppCommand::Rates {
            base: Some("usd".parse().unwrap()),
            all: false,
            trading_days: true,
        },
        &config,
    )
    .await;
    assert!(result.is_ok(), "Rates failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_history_flow_with_mock() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/\d{4}-\d{2}-\d{2}\.\.\d{4}-\d{2}-\d{2}$"))
        .and(query_param("from", "TRY"))
        .and(query_param("to", "USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "amount": 1.0,
            "base": "TRY",
            "start_date": "2025-03-10",
            "end_date": "2025-03-14",
            "rates": {
                "2025-03-10": { "USD": 0.0274 },
                "2025-03-11": { "USD": 0.0273 },
                "2025-03-12": { "USD": 0.0273 },
                "2025-03-13": { "USD": 0.0271 },
                "2025-03-14": { "USD": 0.0270 }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_utils::rates_config(&server);
    let result = run(
        AppCommand::History {
            code: "USD".parse().unwrap(),
            base: None,
            days: Some(7),
        },
        &config,
    )
    .await;
    assert!(result.is_ok(), "History failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_history_rejects_unusable_rate() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/\d{4}-\d{2}-\d{2}\.\.\d{4}-\d{2}-\d{2}$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base": "TRY",
            "rates": {
                "2025-03-13": { "USD": 0.0271 },
                "2025-03-14": { "USD": 0.0 }
            }
        })))
        .mount(&server)
        .await;

    let config = test_utils::rates_config(&server);
    let result = run(
        AppCommand::History {
            code: "USD".parse().unwrap(),
            base: None,
            days: None,
        },
        &config,
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("unusable USD rate"), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_invalid_currency_in_config_fails() {
    let config = test_utils::write_config("currency: \"dollars\"\n");
    let result = run(AppCommand::Logout, &config).await;
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("Invalid currency code"), "{err:#}");
}

#[test_log::test(tokio::test)]
async fn test_account_commands_require_firebase_config() {
    let config = test_utils::write_config("currency: \"TRY\"\n");
    let result = run(AppCommand::Whoami, &config).await;
    assert!(result.unwrap_err().to_string().contains("providers.firebase"));
}

#[test_log::test(tokio::test)]
async fn test_register_creates_profile_document() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(test_utils::auth_body("new-token")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(USER_PATH))
        .and(bearer_token("new-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_utils::account_config(&server, &data_dir);
    let result = run(
        AppCommand::Register {
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password: Some("hunter22".to_string()),
        },
        &config,
    )
    .await;
    assert!(result.is_ok(), "Register failed with: {:?}", result.err());
    // Registration does not sign the user in.
    assert!(!data_dir.path().join("session.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_session_lifecycle() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    test_utils::mount_sign_in(&server, "secret1", "token-1").await;
    Mock::given(method("GET"))
        .and(path(USER_PATH))
        .and(bearer_token("token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/demo/databases/(default)/documents/users/uid-1",
            "fields": {
                "firstName": { "stringValue": "Ada" },
                "lastName": { "stringValue": "Lovelace" },
                "email": { "stringValue": "ada@example.com" },
                "createdAt": { "timestampValue": "2025-01-02T10:00:00Z" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(USER_PATH))
        .and(bearer_token("token-1"))
        .and(query_param("updateMask.fieldPaths", "firstName"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_utils::account_config(&server, &data_dir);
    let session_file = data_dir.path().join("session.json");

    run(login("secret1"), &config).await.unwrap();
    assert!(session_file.exists());
    info!("Signed in, session at {}", session_file.display());

    run(AppCommand::Whoami, &config).await.unwrap();
    run(
        AppCommand::Profile {
            first_name: "Augusta".to_string(),
            last_name: "King".to_string(),
        },
        &config,
    )
    .await
    .unwrap();

    run(AppCommand::Logout, &config).await.unwrap();
    assert!(!session_file.exists());

    let err = run(AppCommand::Whoami, &config).await.unwrap_err();
    assert!(err.to_string().contains("not signed in"), "{err:?}");
}

#[test_log::test(tokio::test)]
async fn test_login_with_wrong_password() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_LOGIN_CREDENTIALS" }
        })))
        .mount(&server)
        .await;

    let config = test_utils::account_config(&server, &data_dir);
    let err = run(login("nope"), &config).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password.");
    assert!(!data_dir.path().join("session.json").exists());
}

#[test_log::test(tokio::test)]
async fn test_change_password_flow() {
    let server = MockServer::start().await;
    let data_dir = TempDir::new().unwrap();
    test_utils::mount_sign_in(&server, "secret1", "token-1").await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "password": "wrong-one",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_PASSWORD" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:update"))
        .and(body_json(json!({
            "idToken": "token-1",
            "password": "newpass1",
            "returnSecureToken": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "ada@example.com",
            "idToken": "token-2",
            "refreshToken": "refresh-2",
            "expiresIn": "3600"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_utils::account_config(&server, &data_dir);
    run(login("secret1"), &config).await.unwrap();

    let passwd = |current: &str, new: &str| AppCommand::Passwd {
        current_password: Some(current.to_string()),
        new_password: Some(new.to_string()),
    };

    let err = run(passwd("secret1", "abc"), &config).await.unwrap_err();
    assert_eq!(err.to_string(), "Password must be at least 6 characters.");

    let err = run(passwd("wrong-one", "newpass1"), &config)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Incorrect current password.");

    run(passwd("secret1", "newpass1"), &config).await.unwrap();

    let stored = fs::read_to_string(data_dir.path().join("session.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored["id_token"], "token-2");
    assert_eq!(stored["uid"], "uid-1");
    assert!(stored.get("refresh_token").is_none());
}
