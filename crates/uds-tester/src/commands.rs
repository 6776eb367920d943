//! Subcommand implementations

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use uds_ecu::response::hex_bytes;
use uds_ecu::{uds, UdsClient, UdsResponse};

use crate::explain::ResponseExplainer;

/// What every command needs: the ECU connection and, optionally, an explainer
pub struct Tester {
    pub client: UdsClient,
    pub explainer: Option<ResponseExplainer>,
}

pub async fn raw(tester: &Tester, input: &str) -> Result<()> {
    let request = parse_hex_bytes(input)?;
    exchange(tester, &request, "Raw request").await?;
    Ok(())
}

pub async fn read_memory(tester: &Tester, address: &str, length: u8) -> Result<()> {
    let address = parse_number(address)?;
    let request = uds::read_memory_request(address, length)
        .ok_or_else(|| anyhow!("Address 0x{:X} does not fit in 24 bits", address))?;
    let context = format!(
        "ReadMemoryByAddress at 0x{:06X}, length {}",
        address, length
    );
    exchange(tester, &request, &context).await?;
    Ok(())
}

pub async fn write_memory(tester: &Tester, address: &str, data: &str) -> Result<()> {
    let address = parse_number(address)?;
    let data = parse_hex_bytes(data)?;
    if data.is_empty() {
        return Err(anyhow!("Write requires at least one data byte"));
    }
    let request = uds::write_memory_request(address, &data)
        .ok_or_else(|| anyhow!("Address 0x{:X} does not fit in 24 bits", address))?;
    let context = format!(
        "WriteMemoryByAddress at 0x{:06X}, {} bytes",
        address,
        data.len()
    );
    exchange(tester, &request, &context).await?;
    Ok(())
}

pub async fn reset(tester: &Tester) -> Result<()> {
    exchange(tester, &uds::ecu_reset_request(), "ECUReset").await?;
    Ok(())
}

pub async fn read_did(tester: &Tester, did: &str) -> Result<()> {
    let did = parse_number(did)?;
    let did = u16::try_from(did).map_err(|_| anyhow!("DID 0x{:X} exceeds 16 bits", did))?;
    let request = uds::read_data_by_id_request(did);
    let context = format!("ReadDataByIdentifier 0x{:04X}", did);

    let raw = exchange(tester, &request, &context).await?;

    // Identification DIDs are ASCII
    if let UdsResponse::Positive { payload, .. } = UdsResponse::parse(&raw) {
        if let Some(value) = payload.get(2..) {
            println!("Value:    {}", String::from_utf8_lossy(value));
        }
    }
    Ok(())
}

async fn exchange(tester: &Tester, request: &[u8], context: &str) -> Result<Vec<u8>> {
    let raw = tester.client.send(request).await?;
    print_exchange(request, &raw);

    if let Some(explainer) = &tester.explainer {
        let explanation = explainer.explain(&hex_bytes(&raw), context).await;
        println!();
        println!("{}", explanation);
    }
    Ok(raw)
}

fn print_exchange(request: &[u8], raw: &[u8]) {
    println!("Request:  {}", hex_bytes(request));
    println!("Response: {}", hex_bytes(raw));

    let response = UdsResponse::parse(raw);
    let summary = response.to_string();
    if response.is_positive() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}

/// Parse hex bytes, tolerating whitespace and `0x` prefixes
fn parse_hex_bytes(input: &str) -> Result<Vec<u8>> {
    let cleaned: String = input
        .split_whitespace()
        .map(|part| {
            part.strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part)
        })
        .collect();
    hex::decode(&cleaned).with_context(|| format!("Invalid hex: {}", input))
}

/// Parse a decimal or 0x-prefixed hex number
fn parse_number(input: &str) -> Result<u32> {
    let s = input.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u32::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.with_context(|| format!("Invalid number: {}", input))
}
