pub mod api;
pub mod transport;

pub use api::{MockApi, like_json, mock_api, page_json, photo_json, test_data_path};
pub use transport::MockTransport;
