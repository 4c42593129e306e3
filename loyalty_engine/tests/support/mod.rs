#![allow(dead_code)]

use loyalty_common::OrderNumber;
use loyalty_engine::{
    db_types::{Order, UserAccount},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    AccountApi,
    OrderFlowApi,
    SqliteDatabase,
};

pub async fn new_db() -> SqliteDatabase {
    prepare_test_env(&random_db_path()).await
}

pub async fn new_account(db: &SqliteDatabase, login: &str) -> UserAccount {
    AccountApi::new(db.clone()).create_account(login).await.expect("Could not create account")
}

pub async fn submit(db: &SqliteDatabase, account: &UserAccount, number: &str) -> Order {
    let result = OrderFlowApi::new(db.clone()).submit_order(account.id, number).await;
    result.expect("Could not submit order").order().clone()
}

pub fn number(s: &str) -> OrderNumber {
    s.parse().expect("Invalid order number in test")
}
