mod http_transport;
mod prepared_vendor;

pub use http_transport::HttpTransport;
pub use prepared_vendor::PreparedVendor;
