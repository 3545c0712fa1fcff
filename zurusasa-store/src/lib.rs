pub mod app_config;
pub mod database;
pub mod booking_repo;
pub mod payment_method_repo;
pub mod catalog_repo;
pub mod redis_repo;
pub mod events;

pub use app_config::Config;
pub use database::DbClient;
pub use booking_repo::StoreBookingRepository;
pub use payment_method_repo::StorePaymentMethodRepository;
pub use catalog_repo::StoreCatalogRepository;
pub use redis_repo::RedisClient;
pub use events::EventProducer;
