//! ERC20 call and event encoding.

use alloy::primitives::{b256, keccak256, Address, Bytes, B256, U256};

/// `keccak256("Transfer(address,address,uint256)")`, topic 0 of every ERC20 transfer log.
pub const TRANSFER_EVENT_SIGNATURE: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Selector of `transfer(address,uint256)`.
pub const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// Selector of `balanceOf(address)`.
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// First four bytes of the keccak256 hash of a method's textual signature.
pub fn method_selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Calldata for `transfer(to, amount)`.
pub fn encode_transfer_call(to: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(4 + 64);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(to.into_word().as_slice());
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    data.into()
}

/// Calldata for `balanceOf(owner)`.
pub fn encode_balance_of_call(owner: Address) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&BALANCE_OF_SELECTOR);
    data.extend_from_slice(owner.into_word().as_slice());
    data.into()
}

/// Decode a single big-endian `uint256`. Empty input decodes as zero;
/// more than 32 bytes is rejected.
pub fn decode_uint(data: &[u8]) -> Option<U256> {
    U256::try_from_be_slice(data)
}
