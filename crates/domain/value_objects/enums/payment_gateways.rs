use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentGateway {
    Stripe,
    Razorpay,
    Manual,
}

impl PaymentGateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentGateway::Stripe => "stripe",
            PaymentGateway::Razorpay => "razorpay",
            PaymentGateway::Manual => "manual",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "stripe" => Some(PaymentGateway::Stripe),
            "razorpay" => Some(PaymentGateway::Razorpay),
            "manual" => Some(PaymentGateway::Manual),
            _ => None,
        }
    }
}

impl Display for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
