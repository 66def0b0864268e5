pub mod chart;
pub mod invoice;
pub mod sheet;

pub use chart::{ChartEntry, ChartPoint};
pub use invoice::{ApiInvoice, ApiInvoiceList, Invoice, InvoicePage, InvoiceStatus};
pub use sheet::{SheetProperties, SheetRow};
