//! Integration tests for the discount edit form.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The admin server running (cargo run -p copper-kettle-admin)

use copper_kettle_core::DiscountType;
use copper_kettle_integration_tests::TestContext;
use reqwest::StatusCode;
use rust_decimal::Decimal;

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_index_links_to_edit_page() {
    let ctx = TestContext::new().await;
    let discount = ctx.create_discount(DiscountType::Flat, Decimal::new(250, 2)).await;

    let resp = ctx
        .client
        .get(ctx.url("/discounts"))
        .send()
        .await
        .expect("Failed to request discounts");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains(&discount.code));
    assert!(body.contains(&format!("/discounts/edit?discount={}", discount.id)));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_edit_without_discount_param_is_fatal() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/discounts/edit"))
        .send()
        .await
        .expect("Failed to request edit page");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Something went wrong."));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_edit_unknown_discount_is_fatal() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url(&format!("/discounts/edit?discount={}", i32::MAX)))
        .send()
        .await
        .expect("Failed to request edit page");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("Something went wrong."));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_amount_description_follows_type() {
    let ctx = TestContext::new().await;
    let flat = ctx.create_discount(DiscountType::Flat, Decimal::new(500, 2)).await;
    let percent = ctx.create_discount(DiscountType::Percent, Decimal::new(10, 0)).await;

    let body = ctx
        .client
        .get(ctx.url(&format!("/discounts/edit?discount={}", flat.id)))
        .send()
        .await
        .expect("Failed to request edit page")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains(r#"id="flat-amount-description" data-visible="true""#));
    assert!(body.contains(r#"id="percent-amount-description" data-visible="false""#));
    assert!(body.contains(&flat.code));

    let body = ctx
        .client
        .get(ctx.url(&format!("/discounts/edit?discount={}", percent.id)))
        .send()
        .await
        .expect("Failed to request edit page")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains(r#"id="flat-amount-description" data-visible="false""#));
    assert!(body.contains(r#"id="percent-amount-description" data-visible="true""#));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_update_redirects_with_notice() {
    let ctx = TestContext::new().await;
    let discount = ctx.create_discount(DiscountType::Percent, Decimal::new(10, 0)).await;
    let id = discount.id.to_string();

    let resp = ctx
        .client
        .post(ctx.url("/discounts/edit"))
        .form(&[
            ("action", "edit_discount"),
            ("discount_id", id.as_str()),
            ("name", "Renamed"),
            ("code", discount.code.as_str()),
            ("type", "flat"),
            ("amount", "7.50"),
            ("start_date", "01/15/2027"),
            ("end_date", "2027-02-15"),
            ("status", "active"),
            ("once_per_customer", "1"),
        ])
        .send()
        .await
        .expect("Failed to submit edit form");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(location.contains("updated=1"));

    let body = ctx
        .client
        .get(ctx.url(&location))
        .send()
        .await
        .expect("Failed to follow redirect")
        .text()
        .await
        .expect("Failed to read response");
    assert!(body.contains("Discount code updated."));
    assert!(body.contains("Renamed"));
    assert!(body.contains("2027-01-15"));
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_invalid_update_rerenders_form() {
    let ctx = TestContext::new().await;
    let discount = ctx.create_discount(DiscountType::Percent, Decimal::new(10, 0)).await;
    let id = discount.id.to_string();

    let resp = ctx
        .client
        .post(ctx.url("/discounts/edit"))
        .form(&[
            ("action", "edit_discount"),
            ("discount_id", id.as_str()),
            ("name", "Too Generous"),
            ("code", discount.code.as_str()),
            ("type", "percent"),
            ("amount", "150"),
            ("status", "active"),
        ])
        .send()
        .await
        .expect("Failed to submit edit form");

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = resp.text().await.expect("Failed to read response");
    assert!(body.contains("cannot exceed 100%"));
    assert!(body.contains("Too Generous"));
}
