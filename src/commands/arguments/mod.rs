mod exchange_date;

pub use exchange_date::ExchangeDateText;
