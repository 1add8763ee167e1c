//! Good Aggregate

use crate::domain::value_objects::{GoodName, Price, Stock};

#[derive(Clone, Debug, PartialEq)]
pub struct Good {
    name: GoodName,
    price: Price,
    count: Stock,
    description: Option<String>,
}

impl Good {
    pub fn new(name: GoodName, price: Price, count: Stock, description: Option<String>) -> Self {
        Self { name, price, count, description }
    }

    pub fn name(&self) -> &GoodName { &self.name }
    pub fn price(&self) -> Price { self.price }
    pub fn count(&self) -> Stock { self.count }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
    pub fn is_in_stock(&self) -> bool { !self.count.is_zero() }

    /// Removes one unit from stock; refuses to go below zero.
    pub fn take_one(&mut self) -> Option<Stock> {
        self.count = self.count.take_one()?;
        Some(self.count)
    }
}
