pub mod billing;
pub mod credentials;
pub mod http;
pub mod memory;
pub mod range;
pub mod sheets;

pub use billing::{BillingApi, HighLevelClient, InvoiceQuery};
pub use credentials::{load_access_token, read_client_id};
pub use http::create_http_client;
pub use memory::MemorySheets;
pub use range::{a1, fit_rows};
pub use sheets::{GoogleSheetsClient, SheetsApi};
