use chrono::{DateTime, Utc};

use super::api::{BlockHeader, NetworkSnapshot};

/* Formatter turns raw network statistics into the HTML messages shown to users.
 * Every function here is pure: the same snapshot (and header, and clock reading)
 * always renders the same string.
 */

const HASHES_PER_MEGAHASH: f64 = 1_000_000.0;
const ATOMIC_UNITS_PER_XMR: u128 = 1_000_000_000_000;
const TIME_FORMAT: &str = "%d %b %Y %H:%M:%S";

pub const MENU_MESSAGE: &str = "<b><i>Explore the Monero Network</i></b>";

/* Utilities */

// Groups the digits of an integer string in threes, e.g. 1234567 -> 1,234,567.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/* Rounds to at most `places` decimals and drops the trailing zeros, keeping one.
 * 0.6 -> "0.6", 500.0 -> "500.0", 42.004 (places = 2) -> "42.0".
 */
fn display_rounded(value: f64, places: usize) -> String {
    let fixed = format!("{:.*}", places, value);
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, fraction.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };
    let fraction = if fraction.is_empty() { "0" } else { fraction };

    match integer.strip_prefix('-') {
        Some(digits) => format!("-{}.{}", group_thousands(digits), fraction),
        None => format!("{}.{}", group_thousands(integer), fraction),
    }
}

fn hashrate_mhs(snapshot: &NetworkSnapshot) -> String {
    display_rounded(snapshot.hashrate_raw as f64 / HASHES_PER_MEGAHASH, 3)
}

fn supply_xmr(snapshot: &NetworkSnapshot) -> String {
    group_thousands(&(snapshot.total_emission_raw / ATOMIC_UNITS_PER_XMR).to_string())
}

fn reward_xmr(snapshot: &NetworkSnapshot) -> String {
    display_rounded(
        snapshot.last_reward_raw as f64 / ATOMIC_UNITS_PER_XMR as f64,
        4,
    )
}

fn block_time(snapshot: &NetworkSnapshot) -> String {
    snapshot.last_timestamp.format(TIME_FORMAT).to_string()
}

// Seconds between the last block and `now`, rounded to 2 decimals.
fn seconds_since(snapshot: &NetworkSnapshot, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(snapshot.last_timestamp);
    display_rounded(elapsed.num_milliseconds() as f64 / 1000.0, 2)
}

fn transaction_noun(count: u64) -> &'static str {
    if count == 1 {
        "transaction"
    } else {
        "transactions"
    }
}

/* Formatters */

pub fn format_height(snapshot: &NetworkSnapshot) -> String {
    format!(
        "The <b>current block height</b> is <code>{}</code>",
        snapshot.height
    )
}

pub fn format_hashrate(snapshot: &NetworkSnapshot) -> String {
    format!(
        "The <b>current network hashrate</b> is approximately <code>{} MH/s</code>",
        hashrate_mhs(snapshot)
    )
}

pub fn format_supply(snapshot: &NetworkSnapshot) -> String {
    format!(
        "The <b>total coinsupply</b> is <code>{} XMR</code>",
        supply_xmr(snapshot)
    )
}

pub fn format_reward(snapshot: &NetworkSnapshot) -> String {
    format!(
        "The <b>last block reward</b> was approximately <code>{} XMR</code>",
        reward_xmr(snapshot)
    )
}

pub fn format_last_block(snapshot: &NetworkSnapshot, now: DateTime<Utc>) -> String {
    format!(
        "The <b>last block</b> was found at <code>{} UTC ({} secs ago)</code>",
        block_time(snapshot),
        seconds_since(snapshot, now)
    )
}

pub fn format_tx_count(snapshot: &NetworkSnapshot, header: &BlockHeader) -> String {
    format!(
        "The <b>last block</b> <code>#{}</code> had <code>{}</code> <b>{}</b> in it.",
        snapshot.height,
        header.num_transactions,
        transaction_noun(header.num_transactions)
    )
}

pub fn format_overview(
    snapshot: &NetworkSnapshot,
    header: &BlockHeader,
    now: DateTime<Utc>,
) -> String {
    let height = format!(
        "<b>Current blockheight</b>: \t<code>{}</code>",
        snapshot.height
    );
    let hashrate = format!(
        "<b>Network Hashrate</b>: \t<code>{} MH/s</code>",
        hashrate_mhs(snapshot)
    );
    let supply = format!(
        "<b>Total Supply</b>: \t<code>{} XMR</code>",
        supply_xmr(snapshot)
    );
    let reward = format!(
        "<b>Last Reward</b>: \t<code>{} XMR</code>",
        reward_xmr(snapshot)
    );
    let last_block = format!(
        "<b>Last block found</b>: \t<code>{} UTC</code>\t<code>({} secs ago)</code> included <code>{}</code> TX",
        block_time(snapshot),
        seconds_since(snapshot, now),
        header.num_transactions
    );

    format!("{height}\n{hashrate}\n{supply}\n{reward}\n{last_block}")
}

pub fn format_help() -> String {
    let introduction = "MoneroBlocksBot gives you stats about the Monero Blockchain and network.\n";
    let overview = "\n<b>Commands are:</b>\n\n<code>/menu</code> shows a button menu\n<code>/overview</code> for all stats in one message";
    let commands = "\n<code>/height</code> for the current block height\n<code>/supply</code> for the total coinsupply\n<code>/reward</code> for the last block reward\n<code>/hashrate</code> for current network hashrate\n<code>/last_block</code> for the timestamp of the latest block\n";
    let closing = "<code>/tx_num</code> for the number of transactions in the latest block\n<code>/help</code> shows this message\n\nA big thanks goes to MoneroBlocks.info for their awesome API.";

    format!("{introduction}{overview}{commands}{closing}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const T: i64 = 1_500_000_000;

    fn snapshot() -> NetworkSnapshot {
        NetworkSnapshot {
            height: 1_000_000,
            hashrate_raw: 500_000_000,
            total_emission_raw: 17_000_000_000_000_000_000,
            last_reward_raw: 600_000_000_000,
            last_timestamp: Utc.timestamp_opt(T, 0).unwrap(),
        }
    }

    fn header(num_transactions: u64) -> BlockHeader {
        BlockHeader {
            height: 1_000_000,
            num_transactions,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("17000000000"), "17,000,000,000");
    }

    #[test]
    fn test_display_rounded() {
        assert_eq!(display_rounded(0.6, 4), "0.6");
        assert_eq!(display_rounded(500.0, 3), "500.0");
        assert_eq!(display_rounded(42.0, 2), "42.0");
        assert_eq!(display_rounded(1.23456, 3), "1.235");
        assert_eq!(display_rounded(2_500.75, 3), "2,500.75");
        assert_eq!(display_rounded(-3.5, 2), "-3.5");
    }

    #[test]
    fn test_format_height() {
        assert_eq!(
            format_height(&snapshot()),
            "The <b>current block height</b> is <code>1000000</code>"
        );
    }

    #[test]
    fn test_format_hashrate() {
        assert!(format_hashrate(&snapshot()).contains("<code>500.0 MH/s</code>"));

        let mut s = snapshot();
        s.hashrate_raw = 500_000;
        assert!(format_hashrate(&s).contains("<code>0.5 MH/s</code>"));

        s.hashrate_raw = 2_876_543_210;
        assert!(format_hashrate(&s).contains("<code>2,876.543 MH/s</code>"));

        s.hashrate_raw = 0;
        assert!(format_hashrate(&s).contains("<code>0.0 MH/s</code>"));
    }

    #[test]
    fn test_format_supply() {
        assert_eq!(
            format_supply(&snapshot()),
            "The <b>total coinsupply</b> is <code>17,000,000 XMR</code>"
        );

        let mut s = snapshot();
        s.total_emission_raw = 17_000_000_000_000_000_000_000;
        assert!(format_supply(&s).contains("<code>17,000,000,000 XMR</code>"));

        // Floor division drops the fractional coin.
        s.total_emission_raw = 18_123_999_999_999_999_999;
        assert!(format_supply(&s).contains("<code>18,123,999 XMR</code>"));
    }

    #[test]
    fn test_format_reward() {
        assert!(format_reward(&snapshot()).contains("<code>0.6 XMR</code>"));

        let mut s = snapshot();
        s.last_reward_raw = 612_345_678_901;
        assert!(format_reward(&s).contains("<code>0.6123 XMR</code>"));
    }

    #[test]
    fn test_format_last_block() {
        let s = snapshot();
        let now = s.last_timestamp + Duration::milliseconds(42_004);
        assert_eq!(
            format_last_block(&s, now),
            "The <b>last block</b> was found at <code>14 Jul 2017 02:40:00 UTC (42.0 secs ago)</code>"
        );

        let now = s.last_timestamp + Duration::milliseconds(125_678);
        assert!(format_last_block(&s, now).contains("(125.68 secs ago)"));
    }

    #[test]
    fn test_format_tx_count_pluralization() {
        let s = snapshot();
        assert_eq!(
            format_tx_count(&s, &header(1)),
            "The <b>last block</b> <code>#1000000</code> had <code>1</code> <b>transaction</b> in it."
        );
        assert!(format_tx_count(&s, &header(0)).contains("<code>0</code> <b>transactions</b>"));
        assert!(format_tx_count(&s, &header(2)).contains("<code>2</code> <b>transactions</b>"));
    }

    #[test]
    fn test_format_overview() {
        let s = snapshot();
        let overview = format_overview(&s, &header(12), s.last_timestamp + Duration::seconds(42));

        assert_eq!(overview.lines().count(), 5);
        assert!(overview.contains("<code>1000000</code>"));
        assert!(overview.contains("<code>500.0 MH/s</code>"));
        assert!(overview.contains("<code>17,000,000 XMR</code>"));
        assert!(overview.contains("<code>0.6 XMR</code>"));
        assert!(overview.contains("(42.0 secs ago)"));
        assert!(overview.contains("included <code>12</code> TX"));
    }

    #[test]
    fn test_formatters_are_deterministic() {
        let s = snapshot();
        let now = s.last_timestamp + Duration::seconds(7);
        assert_eq!(
            format_overview(&s, &header(3), now),
            format_overview(&s, &header(3), now)
        );
        assert_eq!(format_hashrate(&s), format_hashrate(&s));
    }

    #[test]
    fn test_format_help_lists_every_command() {
        let help = format_help();
        for command in [
            "/menu",
            "/overview",
            "/height",
            "/supply",
            "/reward",
            "/hashrate",
            "/last_block",
            "/tx_num",
            "/help",
        ] {
            assert!(help.contains(command), "help is missing {command}");
        }
    }
}
