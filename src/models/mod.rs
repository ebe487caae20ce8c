pub mod payment;

pub use payment::{
    AmbiguousFilter, NewPayment, ParseStatusError, Payment, PaymentFilter, PaymentStatus,
};
