//! 名前によるお客様検索。
//!
//! 1. 入力がフルネーム（[`Customer::full_name`]）と完全一致するお客様がいればそれを返す。
//! 2. いなければ入力を空白で区切り、名または姓がいずれかの語と完全一致するお客様を返す。
//!    大文字小文字は区別し、部分文字列では一致しない。
//! 3. どちらにも該当しなければ空を返す。

use super::core::Customer;

pub fn match_customers(customers: Vec<Customer>, query: &str) -> Vec<Customer> {
    let exact = customers
        .iter()
        .filter(|c| c.full_name() == query)
        .cloned()
        .collect::<Vec<_>>();
    if !exact.is_empty() {
        return exact;
    }

    let tokens = query.split_whitespace().collect::<Vec<_>>();
    customers
        .into_iter()
        .filter(|c| tokens.contains(&c.first_name()) || tokens.contains(&c.last_name()))
        .collect()
}
