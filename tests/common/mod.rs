//! Shared fixtures for integration tests: an in-memory chain, recording
//! sinks and nonce sources.

#![allow(dead_code)]

use alloy::primitives::{keccak256, Address, Bytes, LogData, TxHash, B256, U256};
use alloy::rpc::types::{Filter, Log, TransactionRequest};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use eth_transfer_sync::chain::{BlockBody, BlockTx, ChainError, ChainResult, ChainRpc, HeadEvent, HeadStream};
use eth_transfer_sync::sync::SinkError;
use eth_transfer_sync::transfer::abi::TRANSFER_EVENT_SIGNATURE;
use eth_transfer_sync::transfer::TransferRecord;
use eth_transfer_sync::wallet::{NonceSource, WalletResult};

/// Scriptable in-memory chain node.
pub struct MockChain {
    pub chain_id: u64,
    blocks: Mutex<HashMap<u64, BlockBody>>,
    logs: Mutex<Vec<Log>>,
    head_tx: Mutex<Option<mpsc::UnboundedSender<HeadEvent>>>,
    head_rx: Mutex<Option<mpsc::UnboundedReceiver<HeadEvent>>>,
    failing_blocks: Mutex<HashSet<u64>>,
    fail_send: AtomicBool,
    gas_price: AtomicU64,
    pending_nonce: AtomicU64,
    call_result: Mutex<Bytes>,
    log_head: Mutex<Option<u64>>,

    pub block_calls: Mutex<Vec<u64>>,
    pub log_filters: Mutex<Vec<Filter>>,
    pub subscribe_calls: AtomicUsize,
    pub gas_price_calls: AtomicUsize,
    pub contract_calls: Mutex<Vec<TransactionRequest>>,
    pub broadcasts: Mutex<Vec<Bytes>>,
}

impl MockChain {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            chain_id: 1337,
            blocks: Mutex::new(HashMap::new()),
            logs: Mutex::new(Vec::new()),
            head_tx: Mutex::new(Some(tx)),
            head_rx: Mutex::new(Some(rx)),
            failing_blocks: Mutex::new(HashSet::new()),
            fail_send: AtomicBool::new(false),
            gas_price: AtomicU64::new(20_000_000_000),
            pending_nonce: AtomicU64::new(0),
            call_result: Mutex::new(Bytes::new()),
            log_head: Mutex::new(None),
            block_calls: Mutex::new(Vec::new()),
            log_filters: Mutex::new(Vec::new()),
            subscribe_calls: AtomicUsize::new(0),
            gas_price_calls: AtomicUsize::new(0),
            contract_calls: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
        }
    }

    /// Empty blocks for every height in `range`.
    pub fn with_empty_blocks(self, range: std::ops::RangeInclusive<u64>) -> Self {
        for height in range {
            self.add_block(height, Vec::new());
        }
        self
    }

    pub fn add_block(&self, height: u64, transactions: Vec<BlockTx>) {
        self.blocks.lock().unwrap().insert(
            height,
            BlockBody {
                number: height,
                transactions,
            },
        );
    }

    pub fn add_log(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    pub fn fail_block(&self, height: u64) {
        self.failing_blocks.lock().unwrap().insert(height);
    }

    pub fn heal_block(&self, height: u64) {
        self.failing_blocks.lock().unwrap().remove(&height);
    }

    pub fn push_head(&self, event: HeadEvent) {
        if let Some(tx) = self.head_tx.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// End the head stream, as a dropped connection would.
    pub fn close_heads(&self) {
        self.head_tx.lock().unwrap().take();
    }

    /// Serve logs as a node synced only up to `height`.
    pub fn set_log_head(&self, height: u64) {
        *self.log_head.lock().unwrap() = Some(height);
    }

    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn set_gas_price(&self, wei: u64) {
        self.gas_price.store(wei, Ordering::SeqCst);
    }

    pub fn set_pending_nonce(&self, nonce: u64) {
        self.pending_nonce.store(nonce, Ordering::SeqCst);
    }

    pub fn set_call_result(&self, result: Bytes) {
        *self.call_result.lock().unwrap() = result;
    }

    pub fn block_calls(&self) -> Vec<u64> {
        self.block_calls.lock().unwrap().clone()
    }

    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        self.log_filters
            .lock()
            .unwrap()
            .iter()
            .map(|f| (f.get_from_block().unwrap_or(0), f.get_to_block().unwrap_or(u64::MAX)))
            .collect()
    }

    pub fn log_filters(&self) -> Vec<Filter> {
        self.log_filters.lock().unwrap().clone()
    }

    pub fn broadcasts(&self) -> Vec<Bytes> {
        self.broadcasts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn chain_id(&self) -> ChainResult<u64> {
        Ok(self.chain_id)
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.gas_price_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.gas_price.load(Ordering::SeqCst) as u128)
    }

    async fn block_body(&self, height: u64) -> ChainResult<BlockBody> {
        self.block_calls.lock().unwrap().push(height);
        if self.failing_blocks.lock().unwrap().contains(&height) {
            return Err(ChainError::Rpc(format!("injected failure at block {}", height)));
        }
        self.blocks
            .lock()
            .unwrap()
            .get(&height)
            .cloned()
            .ok_or_else(|| ChainError::Rpc(format!("block {} not found", height)))
    }

    async fn logs(&self, filter: &Filter) -> ChainResult<Vec<Log>> {
        let from = filter.get_from_block().unwrap_or(0);
        let to = filter.get_to_block().unwrap_or(u64::MAX);
        self.log_filters.lock().unwrap().push(filter.clone());

        if let Some(head) = *self.log_head.lock().unwrap() {
            if head < to {
                return Err(ChainError::Rpc(format!(
                    "get_logs: node head {} is behind requested block {}",
                    head, to
                )));
            }
        }

        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|log| log.block_number.is_some_and(|n| n >= from && n <= to))
            .filter(|log| filter.matches(&log.inner))
            .cloned()
            .collect())
    }

    async fn subscribe_heads(&self) -> ChainResult<HeadStream> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let rx = self
            .head_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(ChainError::SubscriptionClosed)?;

        Ok(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }

    async fn balance(&self, _address: Address, _height: Option<u64>) -> ChainResult<U256> {
        Ok(U256::from(1_000u64))
    }

    async fn call(&self, tx: TransactionRequest, _height: Option<u64>) -> ChainResult<Bytes> {
        self.contract_calls.lock().unwrap().push(tx);
        Ok(self.call_result.lock().unwrap().clone())
    }

    async fn transaction_count(&self, _address: Address) -> ChainResult<u64> {
        Ok(self.pending_nonce.load(Ordering::SeqCst))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> ChainResult<TxHash> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ChainError::Rpc("injected broadcast failure".into()));
        }
        self.broadcasts.lock().unwrap().push(Bytes::copy_from_slice(raw));
        Ok(keccak256(raw))
    }
}

/// Sink that keeps every record and can reject the Nth one.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<TransferRecord>>,
    attempts: AtomicUsize,
    /// 1-based attempt number to reject; 0 never rejects.
    fail_on: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(attempt: usize) -> Self {
        let sink = Self::default();
        sink.fail_on.store(attempt, Ordering::SeqCst);
        sink
    }

    pub fn stop_failing(&self) {
        self.fail_on.store(0, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl eth_transfer_sync::sync::TransferSink for RecordingSink {
    async fn on_transfer(&self, record: TransferRecord) -> Result<(), SinkError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on.load(Ordering::SeqCst) {
            return Err(SinkError::new("injected sink failure"));
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Sequential nonces that remember what was handed back.
#[derive(Default)]
pub struct CountingNonces {
    next: AtomicU64,
    pub calls: AtomicUsize,
    pub released: Mutex<Vec<u64>>,
}

impl CountingNonces {
    pub fn starting_at(nonce: u64) -> Self {
        let nonces = Self::default();
        nonces.next.store(nonce, Ordering::SeqCst);
        nonces
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> Vec<u64> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl NonceSource for CountingNonces {
    async fn next_nonce(&self, _address: Address) -> WalletResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }

    async fn release(&self, _address: Address, nonce: u64) {
        self.released.lock().unwrap().push(nonce);
    }
}

pub fn native_tx(hash: u8, from: Address, to: Address, value: u64) -> BlockTx {
    BlockTx {
        hash: TxHash::repeat_byte(hash),
        from,
        to: Some(to),
        value: U256::from(value),
        input: Bytes::new(),
    }
}

pub fn token_log(token: Address, height: u64, tx_hash: TxHash, from: Address, to: Address, amount: u64) -> Log {
    let topics: Vec<B256> = vec![TRANSFER_EVENT_SIGNATURE, from.into_word(), to.into_word()];
    Log {
        inner: alloy::primitives::Log {
            address: token,
            data: LogData::new_unchecked(
                topics,
                U256::from(amount).to_be_bytes::<32>().to_vec().into(),
            ),
        },
        block_number: Some(height),
        transaction_hash: Some(tx_hash),
        ..Default::default()
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until<F>(condition: F) -> bool
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}
