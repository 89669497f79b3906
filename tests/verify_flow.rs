mod common;

use std::time::Duration;

use common::{Route, StubServer, make_temp_home, run, stderr, stdout, write_file};

const HEALTHY_LEAF: &str = r#"{"success":true,"prediction":{"disease":"Healthy_Leaf","confidence":0.97,"model_used":"m1","low_confidence":false}}"#;

#[test]
fn verify_healthy_leaf_end_to_end() {
    let home = make_temp_home("verify");
    let image = home.join("images/leaf.jpg");
    write_file(&image, &[0xff, 0xd8, 0xff, 0xe0, 1, 2, 3, 4]);

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 200, "{}"),
        Route::new("POST", "/predict", 200, HEALTHY_LEAF),
    ]);

    let out = run(
        &home,
        &["--url", &server.base_url, "verify", image.to_str().expect("utf8 path")],
    );
    let so = stdout(&out);
    assert!(out.status.success(), "stdout={so}\nstderr={}", stderr(&out));
    assert!(so.contains("Health: OK"), "stdout={so}");
    assert!(so.contains("Disease detected: Healthy_Leaf"), "stdout={so}");
    assert!(so.contains("Confidence: 97.00%"), "stdout={so}");
    assert!(so.contains("plant appears HEALTHY"), "stdout={so}");
    assert!(!so.contains("WARNING"), "stdout={so}");

    let requests = server.requests();
    assert_eq!(requests.len(), 2, "requests={requests:?}");
    assert_eq!(
        (requests[0].method.as_str(), requests[0].path.as_str()),
        ("GET", "/health")
    );
    let predict = &requests[1];
    assert_eq!((predict.method.as_str(), predict.path.as_str()), ("POST", "/predict"));
    assert!(
        predict
            .header("content-type")
            .is_some_and(|ct| ct.starts_with("multipart/form-data")),
        "headers={:?}",
        predict.headers
    );
    let body = predict.body_text();
    assert!(body.contains(r#"name="image""#), "body={body}");
    assert!(body.contains(r#"filename="leaf.jpg""#), "body={body}");
    assert!(body.contains("image/jpeg"), "body={body}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn verify_json_output_contains_outcome() {
    let home = make_temp_home("verify-json");
    let image = home.join("leaf.jpg");
    write_file(&image, b"jpeg");

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 200, r#"{"status":"ok","model_loaded":true}"#),
        Route::new("POST", "/predict", 200, HEALTHY_LEAF),
    ]);

    let out = run(
        &home,
        &["--json", "--url", &server.base_url, "verify", image.to_str().expect("utf8 path")],
    );
    assert!(out.status.success(), "stderr={}", stderr(&out));

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("parse json");
    assert_eq!(v.pointer("/health/reachable"), Some(&serde_json::json!(true)));
    assert_eq!(
        v.pointer("/health/raw_payload/model_loaded"),
        Some(&serde_json::json!(true))
    );
    assert_eq!(v.pointer("/prediction/status"), Some(&serde_json::json!("success")));
    assert_eq!(v.pointer("/outcome/is_healthy"), Some(&serde_json::json!(true)));
    let pct = v
        .pointer("/outcome/confidence_pct")
        .and_then(|p| p.as_f64())
        .expect("confidence_pct");
    assert!((pct - 97.0).abs() < 1e-9, "pct={pct}");
    assert!(v.get("failure").is_none());

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn unhealthy_service_stops_before_prediction() {
    let home = make_temp_home("verify-unhealthy");
    let image = home.join("leaf.jpg");
    write_file(&image, b"jpeg");

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 503, r#"{"status":"loading"}"#),
        Route::new("POST", "/predict", 200, HEALTHY_LEAF),
    ]);

    let out = run(
        &home,
        &["--url", &server.base_url, "verify", image.to_str().expect("utf8 path")],
    );
    assert_eq!(out.status.code(), Some(10), "stderr={}", stderr(&out));
    assert!(stdout(&out).contains("Health: UNREACHABLE"), "stdout={}", stdout(&out));
    assert!(stderr(&out).contains("health check failed"), "stderr={}", stderr(&out));

    let requests = server.requests();
    assert_eq!(requests.len(), 1, "requests={requests:?}");
    assert_eq!(requests[0].path, "/health");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn rejected_prediction_shows_raw_prediction_and_exits_20() {
    let home = make_temp_home("verify-rejected");
    let image = home.join("leaf.jpg");
    write_file(&image, b"jpeg");

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 200, "{}"),
        Route::new(
            "POST",
            "/predict",
            200,
            r#"{"success":false,"error":"Prediction confidence too low","suggestion":"Use a clearer image","raw_prediction":"Brown_Spot","confidence":0.21}"#,
        ),
    ]);

    let out = run(
        &home,
        &["--url", &server.base_url, "verify", image.to_str().expect("utf8 path")],
    );
    assert_eq!(out.status.code(), Some(20), "stderr={}", stderr(&out));
    let so = stdout(&out);
    assert!(so.contains("Prediction: FAILED"), "stdout={so}");
    assert!(so.contains("Error: Prediction confidence too low"), "stdout={so}");
    assert!(so.contains("Suggestion: Use a clearer image"), "stdout={so}");
    assert!(so.contains("Raw prediction: Brown_Spot"), "stdout={so}");
    assert!(so.contains("Confidence: 21.00%"), "stdout={so}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn malformed_prediction_exits_30() {
    let home = make_temp_home("verify-malformed");
    let image = home.join("leaf.jpg");
    write_file(&image, b"jpeg");

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 200, "{}"),
        Route::new("POST", "/predict", 200, r#"{"prediction":{"disease":"x"}}"#),
    ]);

    let out = run(
        &home,
        &["--url", &server.base_url, "verify", image.to_str().expect("utf8 path")],
    );
    assert_eq!(out.status.code(), Some(30), "stderr={}", stderr(&out));
    assert!(stdout(&out).contains("malformed_response"), "stdout={}", stdout(&out));
    assert!(stderr(&out).contains("success"), "stderr={}", stderr(&out));

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn slow_prediction_times_out() {
    let home = make_temp_home("verify-timeout");
    let image = home.join("leaf.jpg");
    write_file(&image, b"jpeg");

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 200, "{}"),
        Route::new("POST", "/predict", 200, HEALTHY_LEAF).delayed(Duration::from_secs(3)),
    ]);

    let out = run(
        &home,
        &[
            "--url",
            &server.base_url,
            "--predict-timeout",
            "1",
            "verify",
            image.to_str().expect("utf8 path"),
        ],
    );
    assert_eq!(out.status.code(), Some(30), "stderr={}", stderr(&out));
    assert!(stdout(&out).contains("transport_timeout"), "stdout={}", stdout(&out));
    assert!(stderr(&out).contains("model may still be loading"), "stderr={}", stderr(&out));

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn declared_mime_type_is_sent() {
    let home = make_temp_home("verify-mime");
    let image = home.join("leaf.png");
    write_file(&image, b"\x89PNG");

    let server = StubServer::start(vec![Route::new("POST", "/predict", 200, HEALTHY_LEAF)]);

    let out = run(
        &home,
        &[
            "--url",
            &server.base_url,
            "--mime-type",
            "image/png",
            "predict",
            image.to_str().expect("utf8 path"),
        ],
    );
    assert!(out.status.success(), "stderr={}", stderr(&out));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].body_text();
    assert!(body.contains("image/png"), "body={body}");
    assert!(!body.contains("image/jpeg"), "body={body}");

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn save_log_writes_run_log() {
    let home = make_temp_home("verify-log");
    let server = StubServer::start(vec![Route::new("GET", "/health", 200, "{}")]);

    let out = run(&home, &["--url", &server.base_url, "--save-log", "health"]);
    assert!(out.status.success(), "stderr={}", stderr(&out));
    assert!(stdout(&out).contains("Run log: ~/.config/cropcheck/logs/health-"));

    let logs: Vec<_> = std::fs::read_dir(home.join(".config/cropcheck/logs"))
        .expect("logs dir")
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(logs.len(), 1);
    let bytes = std::fs::read(logs[0].path()).expect("read log");
    let v: serde_json::Value = serde_json::from_slice(&bytes).expect("parse log");
    assert_eq!(v.get("command").and_then(|c| c.as_str()), Some("health"));
    assert_eq!(v.get("status").and_then(|c| c.as_str()), Some("ok"));

    let _ = std::fs::remove_dir_all(&home);
}

#[test]
fn non_string_guidance_fields_still_produce_a_diagnosis() {
    let home = make_temp_home("verify-loose");
    let image = home.join("leaf.jpg");
    write_file(&image, b"jpeg");

    let server = StubServer::start(vec![
        Route::new("GET", "/health", 200, "{}"),
        Route::new(
            "POST",
            "/predict",
            200,
            r#"{"success":true,"prediction":{"disease":"Leaf_Blight","confidence":0.9,"model_used":"m1",
                "guidance":{"description":"Fungal lesions","severity":3,"remedies":["Remove leaves",2],"source":"BRRI"}},
                "warning":{"code":"blurry"}}"#,
        ),
    ]);

    let out = run(
        &home,
        &["--url", &server.base_url, "verify", image.to_str().expect("utf8 path")],
    );
    assert!(out.status.success(), "stderr={}", stderr(&out));
    let so = stdout(&out);
    assert!(so.contains("Confidence: 90.00%"), "stdout={so}");
    assert!(so.contains("Severity: 3"), "stdout={so}");
    assert!(so.contains("2. 2"), "stdout={so}");
    assert!(so.contains(r#"Server warning: {"code":"blurry"}"#), "stdout={so}");
    assert!(so.contains("plant may have DISEASE: Leaf_Blight"), "stdout={so}");

    let _ = std::fs::remove_dir_all(&home);
}
