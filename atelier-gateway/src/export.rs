//! CSV export of products and orders

use atelier_shared::{Order, Product, Result};
use std::io::{self, Write};

const PRODUCT_HEADER: [&str; 10] = [
    "Product ID",
    "Name",
    "Category",
    "Status",
    "Base Price",
    "SKU",
    "Size",
    "Color",
    "Variant Price",
    "Stock",
];

const ORDER_HEADER: [&str; 9] = [
    "Order ID",
    "Order Number",
    "Customer",
    "Email",
    "Status",
    "Total",
    "Items",
    "Tracking Number",
    "Created At",
];

/// One row per variant; products without variants get a single row with empty variant columns
pub fn write_products_csv<W: Write + ?Sized>(out: &mut W, products: &[Product]) -> Result<()> {
    let mut writer = csv_writer(out);
    writer.write_record(PRODUCT_HEADER).map_err(io::Error::from)?;

    for product in products {
        let base = [
            product.id.clone(),
            product.name.clone(),
            product.category.clone().unwrap_or_default(),
            product.status().to_string(),
            format_amount(product.price),
        ];

        if product.variants.is_empty() {
            writer
                .write_record(base.iter().map(String::as_str).chain([""; 5]))
                .map_err(io::Error::from)?;
            continue;
        }

        for variant in &product.variants {
            let row = base.iter().cloned().chain([
                variant.sku.clone(),
                variant.size.clone(),
                variant.color.clone(),
                format_amount(variant.price),
                variant.stock.to_string(),
            ]);
            writer.write_record(row).map_err(io::Error::from)?;
        }
    }

    writer.flush()?;
    Ok(())
}

pub fn products_to_csv(products: &[Product]) -> Result<String> {
    let mut buf = Vec::new();
    write_products_csv(&mut buf, products)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn write_orders_csv<W: Write + ?Sized>(out: &mut W, orders: &[Order]) -> Result<()> {
    let mut writer = csv_writer(out);
    writer.write_record(ORDER_HEADER).map_err(io::Error::from)?;

    for order in orders {
        let items: u32 = order.items.iter().map(|item| item.quantity).sum();
        let items = items.to_string();
        let total = format_amount(order.total);
        let row = [
            order.id.as_str(),
            order.order_number.as_deref().unwrap_or_default(),
            order.customer_name.as_deref().unwrap_or_default(),
            order.customer_email.as_deref().unwrap_or_default(),
            order.status.as_str(),
            total.as_str(),
            items.as_str(),
            order.tracking_number.as_deref().unwrap_or_default(),
            order.created_at.as_deref().unwrap_or_default(),
        ];
        writer.write_record(row).map_err(io::Error::from)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn orders_to_csv(orders: &[Order]) -> Result<String> {
    let mut buf = Vec::new();
    write_orders_csv(&mut buf, orders)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// RFC 4180 output: minimal quoting, CRLF record terminator
fn csv_writer<W: Write + ?Sized>(out: &mut W) -> csv::Writer<&mut W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out)
}

fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
