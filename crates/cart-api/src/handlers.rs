//! # Request Handlers
//!
//! Axum request handlers for the storefront cart API.
//! The checkout-total boundary accepts only `{product_id, qty}` pairs and
//! recomputes the trusted total server-side before any payment intent is
//! created; client-supplied prices never enter the computation.

use crate::identity::{ResolvedIdentity, DEVICE_ID_HEADER, USER_ID_HEADER};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use cart_core::{
    CartEntry, CartError, CartIdentity, CartItem, CheckoutEstimate, ItemRef,
    PaymentIntentRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create payment-intent request (checkout boundary shape)
#[derive(Debug, Deserialize)]
pub struct CreatePaymentIntentRequest {
    /// Minimal line-item pairs; prices are resolved server-side
    #[serde(default)]
    pub cart: Vec<CheckoutItem>,
    /// Receipt email (optional)
    #[serde(default, rename = "customerEmail")]
    pub customer_email: Option<String>,
}

/// Item in a checkout request
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    /// Product ID
    pub product_id: String,
    /// Quantity
    #[serde(default = "default_quantity")]
    pub qty: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Create payment-intent response
#[derive(Debug, Serialize)]
pub struct CreatePaymentIntentResponse {
    /// Opaque client secret for the confirmation UI
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

/// Add-to-cart request
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    /// Product ID
    pub product_id: String,
    /// Quantity
    #[serde(default = "default_quantity")]
    pub qty: u32,
}

/// Normalized cart listing with the display estimate
#[derive(Debug, Serialize)]
pub struct CartResponse {
    /// Line items with resolved products
    pub items: Vec<CartItem>,
    /// Total quantity across all items (badge count)
    pub item_count: u32,
    /// Display-only estimate, never authoritative
    pub estimate: CheckoutEstimate,
}

/// Merge response
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    /// Number of local entries merged into the authenticated cart
    pub merged: usize,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

fn cart_error_to_response(err: CartError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "storefront-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a payment intent for the posted cart.
///
/// Mirrors the storefront checkout: the client sends only
/// `{product_id, qty}` pairs, the server recomputes the total from catalog
/// prices and hands the trusted amount to the payment provider.
#[instrument(skip(state, request), fields(items = request.cart.len()))]
pub async fn create_payment_intent(
    State(state): State<crate::state::AppState>,
    Json(request): Json<CreatePaymentIntentRequest>,
) -> HandlerResult<CreatePaymentIntentResponse> {
    if request.cart.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Cart is empty", 400)),
        ));
    }

    // Shape check before any catalog round trip
    for item in &request.cart {
        if item.product_id.is_empty() {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "Invalid cart format: each item must have a product_id",
                    400,
                )),
            ));
        }
    }

    let pairs: Vec<CartEntry> = request
        .cart
        .iter()
        .map(|item| CartEntry::new(item.product_id.clone(), item.qty))
        .collect();

    let total = state
        .totalizer
        .authoritative(state.catalog.as_ref(), &pairs)
        .await
        .map_err(|e| {
            error!("Checkout total rejected: {}", e);
            cart_error_to_response(e)
        })?;

    info!(
        "Creating payment intent: {} items, total={} {}",
        pairs.len(),
        total.total_minor,
        total.currency
    );

    let mut intent_request = PaymentIntentRequest::new(total.total_minor, total.currency);
    if let Some(email) = request.customer_email {
        intent_request = intent_request.with_email(email);
    }

    let intent = state
        .payments
        .create_intent(&intent_request)
        .await
        .map_err(|e| {
            error!("Failed to create payment intent: {}", e);
            cart_error_to_response(e)
        })?;

    info!("Created payment intent: {}", intent.id);

    Ok(Json(CreatePaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}

async fn cart_response(
    state: &crate::state::AppState,
    identity: &CartIdentity,
) -> Result<CartResponse, (StatusCode, Json<ErrorResponse>)> {
    let items = state
        .cart
        .list_items(identity)
        .await
        .map_err(cart_error_to_response)?;

    let item_count = items.iter().map(|i| i.qty).sum();
    let estimate = state.totalizer.estimate(&items);

    Ok(CartResponse {
        items,
        item_count,
        estimate,
    })
}

/// Get the current cart with resolved products and a display estimate
#[instrument(skip(state, identity), fields(identity = %identity.0))]
pub async fn get_cart(
    State(state): State<crate::state::AppState>,
    identity: ResolvedIdentity,
) -> HandlerResult<CartResponse> {
    Ok(Json(cart_response(&state, &identity.0).await?))
}

/// Add a product to the cart (merge by product id)
#[instrument(skip(state, identity, request), fields(identity = %identity.0, product_id = %request.product_id))]
pub async fn add_cart_item(
    State(state): State<crate::state::AppState>,
    identity: ResolvedIdentity,
    Json(request): Json<AddItemRequest>,
) -> HandlerResult<CartResponse> {
    state
        .cart
        .add_item(&identity.0, &request.product_id, request.qty)
        .await
        .map_err(cart_error_to_response)?;

    Ok(Json(cart_response(&state, &identity.0).await?))
}

/// Remove a line item; removing a missing reference is a no-op
#[instrument(skip(state, identity), fields(identity = %identity.0, item_ref = %item_ref))]
pub async fn remove_cart_item(
    State(state): State<crate::state::AppState>,
    identity: ResolvedIdentity,
    Path(item_ref): Path<String>,
) -> HandlerResult<CartResponse> {
    // Anonymous carts key lines by product id, authenticated by row id
    let item_ref = match &identity.0 {
        CartIdentity::Anonymous { .. } => ItemRef::Product(item_ref),
        CartIdentity::Authenticated { .. } => ItemRef::Row(item_ref),
    };

    state
        .cart
        .remove_item(&identity.0, &item_ref)
        .await
        .map_err(cart_error_to_response)?;

    Ok(Json(cart_response(&state, &identity.0).await?))
}

/// Clear the cart (authenticated only)
#[instrument(skip(state, identity), fields(identity = %identity.0))]
pub async fn clear_cart(
    State(state): State<crate::state::AppState>,
    identity: ResolvedIdentity,
) -> HandlerResult<CartResponse> {
    state
        .cart
        .clear(&identity.0)
        .await
        .map_err(cart_error_to_response)?;

    Ok(Json(cart_response(&state, &identity.0).await?))
}

fn required_header(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    format!("Merge requires the {} header", name),
                    400,
                )),
            )
        })
}

/// Merge the device-local cart into the authenticated cart on login.
///
/// Requires both identity headers; quantities for shared products are
/// summed and the local cart is emptied afterwards.
#[instrument(skip(state, headers))]
pub async fn merge_cart(
    State(state): State<crate::state::AppState>,
    headers: HeaderMap,
) -> HandlerResult<MergeResponse> {
    let user_id = required_header(&headers, USER_ID_HEADER)?;
    let device_token = required_header(&headers, DEVICE_ID_HEADER)?;

    let merged = state
        .cart
        .merge_into_authenticated(&device_token, &user_id)
        .await
        .map_err(cart_error_to_response)?;

    info!("Merged {} local entries into cart of {}", merged, user_id);

    Ok(Json(MergeResponse { merged }))
}

/// Get products list
pub async fn list_products(
    State(state): State<crate::state::AppState>,
) -> HandlerResult<serde_json::Value> {
    let products = state
        .catalog
        .list_products()
        .await
        .map_err(cart_error_to_response)?;

    Ok(Json(serde_json::json!({
        "products": products,
        "count": products.len()
    })))
}

/// Get single product
pub async fn get_product(
    State(state): State<crate::state::AppState>,
    Path(product_id): Path<String>,
) -> HandlerResult<cart_core::Product> {
    let mut resolved = state
        .catalog
        .resolve_products(&[product_id.clone()])
        .await
        .map_err(cart_error_to_response)?;

    resolved.remove(&product_id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("Product not found: {}", product_id),
                404,
            )),
        )
    })
}
