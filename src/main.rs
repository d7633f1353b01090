use std::env;
use std::error::Error;

use dotenvy::dotenv;
use log::info;
use pow_ledger::{Ledger, LedgerConfig, Transaction, Wallet};

fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenv();
    env_logger::init();

    let config = LedgerConfig::from_env()?;
    let wallet = match env::var("LEDGER_WALLET_KEY") {
        Ok(secret) => Wallet::from_secret_hex(&secret)?,
        Err(_) => Wallet::generate(),
    };
    let friend = Wallet::generate();

    println!(
        "⛓️ Ledger with difficulty {} and reward {}",
        config.difficulty, config.mining_reward
    );
    info!("wallet address {}", wallet.address());

    let mut ledger = Ledger::with_config(config)?;

    ledger.mine_pending_transactions(wallet.address())?;

    let mut tx = Transaction::new(wallet.address(), friend.address(), ledger.mining_reward());
    tx.sign(&wallet)?;
    ledger.add_transaction(tx)?;

    ledger.mine_pending_transactions(wallet.address())?;

    println!("balance of wallet: {}", ledger.balance_of(wallet.address()));
    println!("balance of friend: {}", ledger.balance_of(friend.address()));
    println!("chain valid: {}", ledger.is_valid());
    println!("{}", serde_json::to_string_pretty(ledger.chain())?);

    Ok(())
}
