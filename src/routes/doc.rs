use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        addresses::{AddressList, CreateAddressRequest},
        cart::{AddToCartRequest, UpdateCartItemRequest},
        checkout::{CheckoutResult, PlaceOrderRequest},
        orders::{OrderDetail, OrderList},
        payments::ProcessPaymentRequest,
        products::{AdjustStockRequest, CreateProductRequest, ProductDetail, ProductList},
    },
    error::ErrorResponse,
    models::{Address, Cart, CartItem, Category, Order, Payment, Product, ProductImage},
    response::{ApiResponse, Meta},
    routes::{addresses, cart, checkout, health, orders, params, payments, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        products::create_product,
        products::adjust_stock,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_cart_item,
        cart::clear_cart,
        addresses::list_addresses,
        addresses::create_address,
        checkout::place_order,
        orders::list_orders,
        orders::get_order,
        payments::get_payment_by_order,
        payments::process_payment
    ),
    components(
        schemas(
            Product,
            Category,
            ProductImage,
            Cart,
            CartItem,
            Address,
            Order,
            Payment,
            AddToCartRequest,
            UpdateCartItemRequest,
            CreateAddressRequest,
            PlaceOrderRequest,
            ProcessPaymentRequest,
            CreateProductRequest,
            AdjustStockRequest,
            AddressList,
            CheckoutResult,
            OrderDetail,
            OrderList,
            ProductDetail,
            ProductList,
            ErrorResponse,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Cart>,
            ApiResponse<CheckoutResult>,
            ApiResponse<Payment>,
            ApiResponse<ProductList>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Addresses", description = "Shipping address endpoints"),
        (name = "Checkout", description = "Order placement"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
