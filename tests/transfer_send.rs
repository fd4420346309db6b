//! Transaction building, signing and broadcast against an in-memory chain.

use alloy::consensus::{SignableTransaction, Signed, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{address, keccak256, Address, Bytes, TxKind, U256};
use std::sync::Arc;

use eth_transfer_sync::chain::ChainError;
use eth_transfer_sync::transfer::abi::{encode_balance_of_call, TRANSFER_SELECTOR};
use eth_transfer_sync::transfer::Asset;
use eth_transfer_sync::wallet::{
    ChainNonceSource, KeySigner, NonceSource, TransferRequest, TxBuilder, WalletError,
};

mod common;
use common::{CountingNonces, MockChain};

const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ANVIL: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
const BOB: Address = address!("b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0");
const TOKEN: Address = address!("7070707070707070707070707070707070707070");

fn setup(first_nonce: u64) -> (Arc<MockChain>, Arc<CountingNonces>, TxBuilder) {
    let chain = Arc::new(MockChain::new());
    let nonces = Arc::new(CountingNonces::starting_at(first_nonce));
    let builder = TxBuilder::new(chain.clone(), nonces.clone(), chain.chain_id);
    (chain, nonces, builder)
}

fn signer() -> KeySigner {
    KeySigner::from_private_key(ANVIL_KEY).unwrap()
}

fn request(asset: Asset, value: u64) -> TransferRequest {
    TransferRequest {
        from: ANVIL,
        to: BOB,
        gas_limit: 60_000,
        value: U256::from(value),
        asset,
    }
}

fn decode(raw: &Bytes) -> Signed<TxLegacy> {
    match TxEnvelope::decode_2718(&mut raw.as_ref()).unwrap() {
        TxEnvelope::Legacy(signed) => signed,
        _ => panic!("expected a legacy transaction"),
    }
}

fn recover(signed: &Signed<TxLegacy>) -> Address {
    signed
        .signature()
        .recover_address_from_prehash(&signed.tx().signature_hash())
        .unwrap()
}

#[tokio::test]
async fn test_native_transfer_is_signed_and_broadcast() {
    let (chain, nonces, builder) = setup(7);

    let sent = builder
        .transfer(&request(Asset::Native, 100_000_000), &signer())
        .await
        .unwrap();
    assert_eq!(sent.nonce, 7);
    assert_eq!(nonces.calls(), 1);

    let broadcasts = chain.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    assert_eq!(sent.tx_hash, keccak256(&broadcasts[0]));

    let signed = decode(&broadcasts[0]);
    let tx = signed.tx();
    assert_eq!(tx.chain_id, Some(1337));
    assert_eq!(tx.nonce, 7);
    assert_eq!(tx.to, TxKind::Call(BOB));
    assert_eq!(tx.value, U256::from(100_000_000u64));
    assert_eq!(tx.gas_limit, 60_000);
    assert_eq!(tx.gas_price, 20_000_000_000);
    assert!(tx.input.is_empty());
    assert_eq!(*signed.hash(), sent.tx_hash);
    assert_eq!(recover(&signed), ANVIL);
}

#[tokio::test]
async fn test_token_transfer_calls_contract() {
    let (chain, _nonces, builder) = setup(0);

    builder
        .transfer(&request(Asset::Token(TOKEN), 500), &signer())
        .await
        .unwrap();

    let signed = decode(&chain.broadcasts()[0]);
    let tx = signed.tx();
    assert_eq!(tx.to, TxKind::Call(TOKEN));
    assert_eq!(tx.value, U256::ZERO);

    let input = tx.input.as_ref();
    assert_eq!(input.len(), 68);
    assert_eq!(&input[..4], &TRANSFER_SELECTOR);
    assert_eq!(&input[4..16], &[0u8; 12]);
    assert_eq!(&input[16..36], BOB.as_slice());
    assert_eq!(U256::from_be_slice(&input[36..68]), U256::from(500));
}

#[tokio::test]
async fn test_foreign_sender_is_refused_before_nonce() {
    let (chain, nonces, builder) = setup(0);
    let mut req = request(Asset::Native, 1);
    req.from = BOB;

    let err = builder.transfer(&req, &signer()).await.unwrap_err();
    match err {
        WalletError::Ownership {
            claimed,
            controlled,
        } => {
            assert_eq!(claimed, BOB);
            assert_eq!(controlled, ANVIL);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(nonces.calls(), 0);
    assert!(chain.broadcasts().is_empty());
    assert_eq!(chain.gas_price_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_broadcast_failure_releases_nonce() {
    let (chain, nonces, builder) = setup(3);
    chain.set_fail_send(true);

    let err = builder
        .transfer(&request(Asset::Native, 1), &signer())
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::Chain(ChainError::Rpc(_))));
    assert_eq!(nonces.released(), vec![3]);
}

#[tokio::test]
async fn test_fixed_gas_price_skips_suggestion() {
    let (chain, _nonces, builder) = setup(0);
    let builder = builder.with_gas_price(Some(1_500_000_000));

    builder
        .transfer(&request(Asset::Native, 1), &signer())
        .await
        .unwrap();

    assert_eq!(chain.gas_price_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(decode(&chain.broadcasts()[0]).tx().gas_price, 1_500_000_000);
}

#[tokio::test]
async fn test_suggested_gas_price_above_cap() {
    let (chain, nonces, builder) = setup(9);
    chain.set_gas_price(600_000_000_000);
    let builder = builder.with_max_gas_price_gwei(500);

    let err = builder
        .transfer(&request(Asset::Native, 1), &signer())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WalletError::GasPriceTooHigh {
            current_gwei: 600,
            max_gwei: 500
        }
    ));
    assert_eq!(nonces.released(), vec![9]);
    assert!(chain.broadcasts().is_empty());
}

#[tokio::test]
async fn test_connect_uses_node_chain_id() {
    let chain = Arc::new(MockChain::new());
    let builder = TxBuilder::connect(chain.clone(), Arc::new(CountingNonces::default()))
        .await
        .unwrap();
    assert_eq!(builder.chain_id(), 1337);
}

#[tokio::test]
async fn test_balances() {
    let (chain, _nonces, builder) = setup(0);

    assert_eq!(
        builder.native_balance(ANVIL, None).await.unwrap(),
        U256::from(1_000u64)
    );

    chain.set_call_result(Bytes::from(U256::from(1234).to_be_bytes::<32>().to_vec()));
    let balance = builder.token_balance(TOKEN, ANVIL, Some(10)).await.unwrap();
    assert_eq!(balance, U256::from(1234));

    let calls = chain.contract_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].to, Some(TxKind::Call(TOKEN)));
    assert_eq!(calls[0].input.input(), Some(&encode_balance_of_call(ANVIL)));

    chain.set_call_result(Bytes::from(vec![1u8; 40]));
    let err = builder.token_balance(TOKEN, ANVIL, None).await.unwrap_err();
    assert!(matches!(err, WalletError::Chain(ChainError::Rpc(_))));
}

#[tokio::test]
async fn test_chain_nonces_are_unique_under_concurrency() {
    let chain = Arc::new(MockChain::new());
    chain.set_pending_nonce(5);
    let nonces = Arc::new(ChainNonceSource::new(chain.clone()));

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let nonces = nonces.clone();
            tokio::spawn(async move { nonces.next_nonce(ANVIL).await.unwrap() })
        })
        .collect();

    let mut issued = Vec::new();
    for task in tasks {
        issued.push(task.await.unwrap());
    }
    issued.sort_unstable();
    assert_eq!(issued, (5..15).collect::<Vec<_>>());

    // Only the most recent nonce can be handed back
    nonces.release(ANVIL, 10).await;
    nonces.release(ANVIL, 14).await;
    assert_eq!(nonces.next_nonce(ANVIL).await.unwrap(), 14);

    // The node moving ahead wins over the local counter
    chain.set_pending_nonce(20);
    assert_eq!(nonces.next_nonce(ANVIL).await.unwrap(), 20);

    // Other senders are tracked independently
    assert_eq!(nonces.next_nonce(BOB).await.unwrap(), 20);
}
