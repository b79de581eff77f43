use crate::domain::order::{Order, OrderStatus};
use crate::domain::payment::Payment;
use crate::error::{Error, Result};
use std::io::Write;

/// Writes the final payment/order state as CSV, one row per payment with
/// the materialized order's status joined in.
pub struct PaymentReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentReportWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(destination),
        }
    }

    pub fn write_report(&mut self, payments: &[Payment], orders: &[Order]) -> Result<()> {
        let csv_err = |err: csv::Error| Error::Store(err.to_string());

        self.writer
            .write_record([
                "transaction_id",
                "order_id",
                "amount",
                "successful",
                "order_status",
            ])
            .map_err(csv_err)?;

        for payment in payments {
            let successful = match payment.successful {
                Some(true) => "true",
                Some(false) => "false",
                None => "",
            };
            let order_status = orders
                .iter()
                .find(|order| order.transaction_id == payment.transaction_id)
                .map(|order| match order.status {
                    OrderStatus::Preparing => "preparing",
                    OrderStatus::Sent => "sent",
                })
                .unwrap_or("");

            self.writer
                .write_record([
                    payment.transaction_id.as_str(),
                    payment.order_id.as_str(),
                    &payment.amount.value().to_string(),
                    successful,
                    order_status,
                ])
                .map_err(csv_err)?;
        }

        self.writer.flush().map_err(|err| Error::Store(err.to_string()))
    }
}
