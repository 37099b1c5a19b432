#![allow(
    clippy::module_name_repetitions,
    reason = "Request suffix is intentional for clarity"
)]

use bon::Builder;
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::Result;
use crate::error::Error;
use crate::rest::types::InvoiceStatus;
use crate::types::{Decimal, OrderStatus, OrderType, Side};
use crate::units;

#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[non_exhaustive]
pub struct OrderbookRequest {
    #[serde(skip_serializing)]
    #[builder(into)]
    pub symbol: String,
    /// Number of levels per side
    pub depth: Option<u32>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[non_exhaustive]
pub struct TradesRequest {
    #[serde(skip_serializing)]
    #[builder(into)]
    pub symbol: String,
    pub limit: Option<u32>,
}

/// A new order. Limit orders must carry a `price`.
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Serialize)]
#[non_exhaustive]
pub struct CreateOrderRequest {
    #[builder(into)]
    pub symbol: String,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    #[builder(into)]
    pub client_order_id: Option<String>,
}

impl CreateOrderRequest {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.quantity <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "Order quantity must be positive, got {}",
                self.quantity
            )));
        }

        match (self.order_type, self.price) {
            (OrderType::Limit, None) => Err(Error::validation("Limit orders require a price")),
            (_, Some(price)) if price <= Decimal::ZERO => Err(Error::validation(format!(
                "Order price must be positive, got {price}"
            ))),
            _ => Ok(()),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Default, Serialize)]
#[non_exhaustive]
pub struct OrdersRequest {
    #[builder(into)]
    pub symbol: Option<String>,
    pub status: Option<OrderStatus>,
    pub limit: Option<u32>,
}

/// Withdrawal of `amount` to an external `address`.
///
/// `amount` is expressed in whole units; it is sent to the API in the asset's base units, so
/// `decimals` must match the asset.
#[derive(Debug, Clone, Builder)]
#[non_exhaustive]
pub struct WithdrawalRequest {
    #[builder(into)]
    pub asset: String,
    pub amount: Decimal,
    pub decimals: u32,
    #[builder(into)]
    pub address: String,
    #[builder(into)]
    pub network: Option<String>,
    #[builder(into)]
    pub memo: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub(crate) struct WithdrawalBody<'req> {
    asset: &'req str,
    amount: String,
    address: &'req str,
    network: Option<&'req str>,
    memo: Option<&'req str>,
}

impl WithdrawalRequest {
    pub(crate) fn body(&self) -> Result<WithdrawalBody<'_>> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "Withdrawal amount must be positive, got {}",
                self.amount
            )));
        }

        Ok(WithdrawalBody {
            asset: &self.asset,
            amount: units::from_decimal(self.amount, self.decimals)?,
            address: &self.address,
            network: self.network.as_deref(),
            memo: self.memo.as_deref(),
        })
    }
}

/// An invoice for `amount` of `asset`, in whole units.
#[derive(Debug, Clone, Builder)]
#[non_exhaustive]
pub struct CreateInvoiceRequest {
    #[builder(into)]
    pub asset: String,
    pub amount: Decimal,
    pub decimals: u32,
    #[builder(into)]
    pub description: Option<String>,
    /// Seconds until the invoice expires
    pub expires_in: Option<u64>,
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub(crate) struct CreateInvoiceBody<'req> {
    asset: &'req str,
    amount: String,
    description: Option<&'req str>,
    expires_in: Option<u64>,
}

impl CreateInvoiceRequest {
    pub(crate) fn body(&self) -> Result<CreateInvoiceBody<'_>> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation(format!(
                "Invoice amount must be positive, got {}",
                self.amount
            )));
        }

        Ok(CreateInvoiceBody {
            asset: &self.asset,
            amount: units::from_decimal(self.amount, self.decimals)?,
            description: self.description.as_deref(),
            expires_in: self.expires_in,
        })
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Default, Serialize)]
#[non_exhaustive]
pub struct InvoicesRequest {
    pub status: Option<InvoiceStatus>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::ToQueryParams as _;
    use crate::error::Kind;

    #[test]
    fn path_params_should_not_reach_query() {
        let request = OrderbookRequest::builder()
            .symbol("BTC-USDT")
            .depth(10)
            .build();
        assert_eq!(request.query_params(None), "?depth=10");

        let request = TradesRequest::builder().symbol("BTC-USDT").build();
        assert_eq!(request.query_params(None), "");
    }

    #[test]
    fn orders_request_should_serialize_filters() {
        let request = OrdersRequest::builder()
            .symbol("ETH-USDT")
            .status(OrderStatus::PartiallyFilled)
            .limit(50)
            .build();

        assert_eq!(
            request.query_params(None),
            "?symbol=ETH-USDT&status=partially_filled&limit=50"
        );
        assert_eq!(OrdersRequest::default().query_params(None), "");
    }

    #[test]
    fn create_order_should_serialize_type_and_skip_missing_price() {
        let request = CreateOrderRequest::builder()
            .symbol("BTC-USDT")
            .side(Side::Buy)
            .order_type(OrderType::Market)
            .quantity(dec!(0.5))
            .build();

        request.validate().unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "symbol": "BTC-USDT",
                "side": "buy",
                "type": "market",
                "quantity": "0.5"
            })
        );
    }

    #[test]
    fn limit_order_without_price_should_fail_validation() {
        let request = CreateOrderRequest::builder()
            .symbol("BTC-USDT")
            .side(Side::Sell)
            .order_type(OrderType::Limit)
            .quantity(dec!(1))
            .build();

        assert_eq!(request.validate().unwrap_err().kind(), Kind::Validation);
    }

    #[test]
    fn withdrawal_body_should_carry_raw_units() {
        let request = WithdrawalRequest::builder()
            .asset("USDT")
            .amount(dec!(1.5))
            .decimals(6)
            .address("0xabc")
            .build();

        assert_eq!(
            serde_json::to_value(request.body().unwrap()).unwrap(),
            json!({ "asset": "USDT", "amount": "1500000", "address": "0xabc" })
        );
    }

    #[test]
    fn invoice_body_should_reject_excess_precision() {
        let request = CreateInvoiceRequest::builder()
            .asset("BTC")
            .amount(dec!(0.000000001))
            .decimals(8)
            .build();

        assert_eq!(request.body().unwrap_err().kind(), Kind::Validation);
    }
}
