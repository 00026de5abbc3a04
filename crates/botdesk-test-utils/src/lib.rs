pub mod assertions;
pub mod server;
pub mod stores;

pub use assertions::{assert_api_error, assert_api_ok};
pub use server::{
    TEST_ACCESS_SECRET, TEST_PUBLIC_URL, TestAppState, TestUser, create_admin,
    create_test_app_state, create_test_config, create_test_identity, create_test_router,
    create_test_router_and_stores, create_user, header_str, send_request,
    send_request_with_headers,
};
pub use stores::{TestStores, create_test_stores, insert_subscriber};
