use actix_web::{test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use careers_jobs::api::job::JobService;
use careers_jobs::db::{JobStore, MemoryJobStore};
use careers_jobs::query::ListingLimits;

fn job(slug: &str, job_type: &str, posted_days_ago: i32) -> Value {
    json!({
        "title": format!("Backend Engineer {}", slug),
        "work_policy": "Remote",
        "location": "Bangalore, India",
        "department": "Platform",
        "employment_type": "Full-time",
        "experience_level": "Senior",
        "job_type": job_type,
        "salary_range": {"min": 1_200_000.0, "max": 2_000_000.0},
        "job_slug": slug,
        "posted_days_ago": posted_days_ago
    })
}

fn service(store: Arc<MemoryJobStore>) -> web::Data<JobService> {
    web::Data::new(JobService::new(store, ListingLimits::default()))
}

async fn seed(store: &MemoryJobStore, count: usize, job_type: &str) {
    for i in 0..count {
        let new_job = serde_json::from_value(job(&format!("job-{:02}", i), job_type, i as i32)).unwrap();
        store.insert(&new_job).await.unwrap();
    }
}

macro_rules! app {
    ($store:expr) => {
        test::init_service(
            App::new()
                .app_data(service($store.clone()))
                .configure(careers_jobs::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn pages_split_a_filtered_listing() {
    let store = Arc::new(MemoryJobStore::new());
    seed(&store, 25, "Tech").await;
    seed_one(&store, "design-lead", "Design").await;
    let app = app!(store);

    let first: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/jobs?jobType=Tech&limit=20&offset=0")
            .to_request(),
    )
    .await;
    let second: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/jobs?jobType=Tech&limit=20&offset=1")
            .to_request(),
    )
    .await;

    assert_eq!(first["success"], true);
    let first = first["data"].as_array().unwrap();
    let second = second["data"].as_array().unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(second.len(), 5);

    // freshest first by default, no overlap between pages
    assert_eq!(first[0]["posted_days_ago"], 0);
    assert_eq!(second[4]["posted_days_ago"], 24);
    for job in first.iter().chain(second) {
        assert_eq!(job["job_type"], "Tech");
        assert!(job.get("id").is_none());
    }
}

async fn seed_one(store: &MemoryJobStore, slug: &str, job_type: &str) {
    let new_job = serde_json::from_value(job(slug, job_type, 3)).unwrap();
    store.insert(&new_job).await.unwrap();
}

#[actix_web::test]
async fn sort_flag_reverses_the_order() {
    let store = Arc::new(MemoryJobStore::new());
    seed(&store, 5, "Tech").await;
    let app = app!(store);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/jobs?sortBy=false").to_request(),
    )
    .await;

    let days: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["posted_days_ago"].as_i64().unwrap())
        .collect();
    assert_eq!(days, vec![4, 3, 2, 1, 0]);
}

#[actix_web::test]
async fn empty_sort_flag_uses_the_default_order() {
    let store = Arc::new(MemoryJobStore::new());
    seed(&store, 3, "Tech").await;
    let app = app!(store);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/jobs?sortBy=").to_request(),
    )
    .await;

    let days: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|job| job["posted_days_ago"].as_i64().unwrap())
        .collect();
    assert_eq!(days, vec![0, 1, 2]);
}

#[actix_web::test]
async fn search_length_boundary() {
    let store = Arc::new(MemoryJobStore::new());
    seed(&store, 3, "Tech").await;
    let app = app!(store);

    let at_limit = format!("<script>{}", "a".repeat(92));
    assert_eq!(at_limit.chars().count(), 100);
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs?search={}", urlencode(&at_limit)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], json!([]));

    let over = format!("{}a", at_limit);
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/jobs?search={}", urlencode(&over)))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "search must not exceed 100 characters");
}

#[actix_web::test]
async fn metacharacters_in_search_match_literally() {
    let store = Arc::new(MemoryJobStore::new());
    let mut plus = job("cpp-dev", "Tech", 1);
    plus["title"] = json!("C++ Developer");
    store.insert(&serde_json::from_value(plus).unwrap()).await.unwrap();
    seed_one(&store, "cobol-dev", "Tech").await;
    let app = app!(store);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/jobs?search=c%2B%2B").to_request(),
    )
    .await;

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["job_slug"], "cpp-dev");
}

#[actix_web::test]
async fn bulk_insert_keeps_rows_around_a_duplicate() {
    let store = Arc::new(MemoryJobStore::new());
    seed_one(&store, "taken", "Tech").await;
    let app = app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs/bulk")
            .set_json(json!({
                "jobs": [job("first", "Tech", 1), job("taken", "Tech", 2), job("third", "Design", 3)]
            }))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), 409);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["insertedCount"], 2);
    assert!(body["details"].as_str().unwrap().contains("taken"));
    assert_eq!(body["failures"][0]["index"], 1);
    assert_eq!(body["failures"][0]["kind"], "duplicate");

    for slug in ["first", "third"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/jobs/{}", slug)).to_request(),
        )
        .await;
        assert_eq!(resp.status(), 200, "{} should have been inserted", slug);
    }
    assert_eq!(store.len(), 3);
}

#[actix_web::test]
async fn bulk_accepts_a_bare_array() {
    let store = Arc::new(MemoryJobStore::new());
    let app = app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs/bulk")
            .set_json(json!([job("one", "Tech", 1), job("two", "Management", 2)]))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["insertedCount"], 2);
    assert!(body.get("failures").is_none());
}

#[actix_web::test]
async fn single_insert_then_lookup() {
    let store = Arc::new(MemoryJobStore::new());
    let app = app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs")
            .set_json(job("Data-Engineer", "Tech", 0))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["job_slug"], "data-engineer");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs")
            .set_json(job("data-engineer", "Tech", 0))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 409);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/jobs/data-engineer").to_request(),
    )
    .await;
    assert_eq!(body["data"]["salary_range"]["currency"], "INR");

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/jobs/missing").to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn single_and_bulk_paths_store_the_same_slug() {
    let store = Arc::new(MemoryJobStore::new());
    let app = app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs/bulk")
            .set_json(json!([job("Platform-Lead", "Management", 4)]))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs")
            .set_json(job("platform-lead", "Management", 4))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 409);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/jobs/platform-lead").to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn route_names_cannot_be_used_as_slugs() {
    let store = Arc::new(MemoryJobStore::new());
    let app = app!(store);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs")
            .set_json(job("filters", "Tech", 0))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/jobs/bulk")
            .set_json(json!([job("filters", "Tech", 0)]))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 400);
    assert!(store.is_empty());
}

#[actix_web::test]
async fn filter_options_list_the_sentinels() {
    let store = Arc::new(MemoryJobStore::new());
    let app = app!(store);

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/jobs/filters").to_request(),
    )
    .await;

    assert_eq!(body["data"]["locations"][0], "All Locations");
    assert_eq!(body["data"]["jobTypes"][0], "All Job Types");
    assert_eq!(body["data"]["sortOptions"][0]["value"], "true");
}

fn urlencode(raw: &str) -> String {
    raw.bytes()
        .map(|b| match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}
