pub mod lifecycle;
pub mod charge;
pub mod orchestrator;

pub use lifecycle::{BookingLifecycle, BookingManager, OrderError};
pub use charge::{
    ChargeProvider, ClientReportedGateway, GatewayChargeProvider, PaystackGateway,
    SimulatedChargeProvider,
};
pub use orchestrator::{
    CheckoutController, CheckoutError, CheckoutOutcome, CheckoutRequest, CheckoutServices,
    MethodSelection,
};
