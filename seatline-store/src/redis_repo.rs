use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use seatline_core::{Seat, SeatRepository, SeatStatus, StoreError};
use tracing::info;

const DEFAULT_NAMESPACE: &str = "seatline";

// Compare-and-set of status + hold_deadline.
// Returns {1, status} when applied, {0, current_status} when the seat moved
// on, {-1, ""} when the seat does not exist.
const UPDATE_SCRIPT: &str = r#"
    local current = redis.call("HMGET", KEYS[1], "status", "hold_deadline")
    if not current[1] then
        return {-1, ""}
    end
    if current[1] ~= ARGV[1] or current[2] ~= ARGV[2] then
        return {0, current[1]}
    end
    redis.call("HSET", KEYS[1], "status", ARGV[3], "hold_deadline", ARGV[4])
    return {1, current[1]}
"#;

fn backend(err: redis::RedisError) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Durable seat table in Redis.
///
/// One hash per seat (`{ns}:seat:{label}` with id/label/status/hold_deadline)
/// and a sorted set `{ns}:seats:index` of labels scored by id. A deadline of
/// `0` means "no hold". Updates are compare-and-set in a Lua script, so any
/// number of processes can share one Redis.
#[derive(Clone)]
pub struct RedisSeatRepository {
    conn: MultiplexedConnection,
    namespace: String,
    update_script: redis::Script,
}

impl RedisSeatRepository {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        Self::with_namespace(connection_string, DEFAULT_NAMESPACE).await
    }

    pub async fn with_namespace(
        connection_string: &str,
        namespace: &str,
    ) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!(namespace, "Connected to Redis seat store");
        Ok(Self {
            conn,
            namespace: namespace.to_string(),
            update_script: redis::Script::new(UPDATE_SCRIPT),
        })
    }

    fn seat_key(&self, label: &str) -> String {
        format!("{}:seat:{}", self.namespace, label)
    }

    fn index_key(&self) -> String {
        format!("{}:seats:index", self.namespace)
    }
}

fn encode_deadline(seat: &Seat) -> i64 {
    seat.hold_deadline.unwrap_or(0)
}

/// Rebuild a seat from its hash fields.
fn seat_from_hash(key: &str, fields: &HashMap<String, String>) -> Result<Seat, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        key: key.to_string(),
        reason,
    };
    let field = |name: &str| {
        fields
            .get(name)
            .ok_or_else(|| corrupt(format!("missing field {}", name)))
    };

    let id = field("id")?
        .parse::<u32>()
        .map_err(|e| corrupt(format!("bad id: {}", e)))?;
    let label = field("label")?.clone();
    let status_raw = field("status")?;
    let status = SeatStatus::parse(status_raw)
        .ok_or_else(|| corrupt(format!("bad status: {}", status_raw)))?;
    let deadline = field("hold_deadline")?
        .parse::<i64>()
        .map_err(|e| corrupt(format!("bad hold_deadline: {}", e)))?;

    let hold_deadline = match (status, deadline) {
        (SeatStatus::Reserved, 0) => return Err(corrupt("reserved seat without deadline".into())),
        (SeatStatus::Reserved, d) => Some(d),
        (_, 0) => None,
        (s, _) => return Err(corrupt(format!("{} seat with a deadline", s))),
    };

    Ok(Seat {
        id,
        label,
        status,
        hold_deadline,
    })
}

/// Interpret the update script's reply.
fn check_update(key: &str, label: &str, applied: i64, current: &str) -> Result<(), StoreError> {
    match applied {
        1 => Ok(()),
        0 => {
            let actual = SeatStatus::parse(current).ok_or_else(|| StoreError::Corrupt {
                key: key.to_string(),
                reason: format!("bad status: {}", current),
            })?;
            Err(StoreError::Stale {
                label: label.to_string(),
                actual,
            })
        }
        _ => Err(StoreError::Backend(format!("Unknown seat: {}", label))),
    }
}

#[async_trait]
impl SeatRepository for RedisSeatRepository {
    async fn count(&self) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        redis::cmd("ZCARD")
            .arg(self.index_key())
            .query_async(&mut conn)
            .await
            .map_err(backend)
    }

    async fn insert_many(&self, seats: &[Seat]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let index_key = self.index_key();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for seat in seats {
            pipe.cmd("HSET")
                .arg(self.seat_key(&seat.label))
                .arg("id")
                .arg(seat.id)
                .arg("label")
                .arg(&seat.label)
                .arg("status")
                .arg(seat.status.as_str())
                .arg("hold_deadline")
                .arg(encode_deadline(seat))
                .ignore();
            pipe.cmd("ZADD")
                .arg(&index_key)
                .arg(seat.id)
                .arg(&seat.label)
                .ignore();
        }

        let _: () = pipe.query_async(&mut conn).await.map_err(backend)?;
        Ok(())
    }

    async fn get(&self, label: &str) -> Result<Option<Seat>, StoreError> {
        let mut conn = self.conn.clone();
        let key = self.seat_key(label);
        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        if fields.is_empty() {
            return Ok(None);
        }
        seat_from_hash(&key, &fields).map(Some)
    }

    async fn all(&self) -> Result<Vec<Seat>, StoreError> {
        let mut conn = self.conn.clone();
        let labels: Vec<String> = redis::cmd("ZRANGE")
            .arg(self.index_key())
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;

        if labels.is_empty() {
            return Ok(Vec::new());
        }

        let mut pipe = redis::pipe();
        for label in &labels {
            pipe.cmd("HGETALL").arg(self.seat_key(label));
        }
        let rows: Vec<HashMap<String, String>> = pipe.query_async(&mut conn).await.map_err(backend)?;

        labels
            .iter()
            .zip(rows.iter())
            .map(|(label, fields)| seat_from_hash(&self.seat_key(label), fields))
            .collect()
    }

    async fn update(&self, expected: &Seat, next: &Seat) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let key = self.seat_key(&next.label);
        let (applied, current): (i64, String) = self
            .update_script
            .key(&key)
            .arg(expected.status.as_str())
            .arg(encode_deadline(expected))
            .arg(next.status.as_str())
            .arg(encode_deadline(next))
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        check_update(&key, &next.label, applied, &current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_decodes_reserved_and_available_seats() {
        let reserved = seat_from_hash(
            "seat:A1",
            &fields(&[("id", "1"), ("label", "A1"), ("status", "RESERVED"), ("hold_deadline", "40")]),
        )
        .unwrap();
        assert_eq!(reserved.status, SeatStatus::Reserved);
        assert_eq!(reserved.hold_deadline, Some(40));

        let available = seat_from_hash(
            "seat:A2",
            &fields(&[("id", "2"), ("label", "A2"), ("status", "AVAILABLE"), ("hold_deadline", "0")]),
        )
        .unwrap();
        assert_eq!(available, Seat::new(2, "A2"));
    }

    #[test]
    fn test_rejects_records_that_break_the_deadline_invariant() {
        let no_deadline = seat_from_hash(
            "seat:A1",
            &fields(&[("id", "1"), ("label", "A1"), ("status", "RESERVED"), ("hold_deadline", "0")]),
        );
        assert!(matches!(no_deadline, Err(StoreError::Corrupt { .. })));

        let stale_deadline = seat_from_hash(
            "seat:A1",
            &fields(&[("id", "1"), ("label", "A1"), ("status", "SOLD"), ("hold_deadline", "40")]),
        );
        assert!(matches!(stale_deadline, Err(StoreError::Corrupt { .. })));

        let missing = seat_from_hash("seat:A1", &fields(&[("id", "1")]));
        assert!(matches!(missing, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_deadline_encoding() {
        let mut seat = Seat::new(1, "A1");
        assert_eq!(encode_deadline(&seat), 0);
        seat.hold_until(40);
        assert_eq!(encode_deadline(&seat), 40);
    }

    #[test]
    fn test_update_reply_maps_lost_race_to_stale() {
        assert!(check_update("k", "A1", 1, "AVAILABLE").is_ok());
        assert!(matches!(
            check_update("k", "A1", 0, "RESERVED"),
            Err(StoreError::Stale { actual: SeatStatus::Reserved, .. })
        ));
        assert!(matches!(check_update("k", "A1", 0, "HELD"), Err(StoreError::Corrupt { .. })));
        assert!(matches!(check_update("k", "A9", -1, ""), Err(StoreError::Backend(_))));
    }

    // Live Redis tests: `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored`

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    fn test_namespace(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        format!("seatline-test:{}:{}:{}", name, std::process::id(), nanos)
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_redis_seed_list_and_update() {
        let repo = RedisSeatRepository::with_namespace(&redis_url(), &test_namespace("seed"))
            .await
            .unwrap();
        repo.insert_many(&seatline_core::InventoryLayout::new(12, "A").seats())
            .await
            .unwrap();
        assert_eq!(repo.count().await.unwrap(), 12);

        let seats = repo.all().await.unwrap();
        let ids: Vec<u32> = seats.iter().map(|s| s.id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());

        let seat = repo.get("A10").await.unwrap().unwrap();
        let mut held = seat.clone();
        held.hold_until(40);
        repo.update(&seat, &held).await.unwrap();
        assert_eq!(repo.get("A10").await.unwrap().unwrap(), held);
        assert!(repo.get("Z99").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_redis_two_processes_cannot_both_reserve() {
        let ns = test_namespace("race");
        let first = RedisSeatRepository::with_namespace(&redis_url(), &ns).await.unwrap();
        let second = RedisSeatRepository::with_namespace(&redis_url(), &ns).await.unwrap();
        first.insert_many(&[Seat::new(1, "A1")]).await.unwrap();

        // Both read AVAILABLE before either writes
        let seen_first = first.get("A1").await.unwrap().unwrap();
        let seen_second = second.get("A1").await.unwrap().unwrap();

        let mut held_first = seen_first.clone();
        held_first.hold_until(30);
        let mut held_second = seen_second.clone();
        held_second.hold_until(45);

        first.update(&seen_first, &held_first).await.unwrap();
        let err = second.update(&seen_second, &held_second).await.unwrap_err();
        assert!(matches!(err, StoreError::Stale { actual: SeatStatus::Reserved, .. }));

        let stored = second.get("A1").await.unwrap().unwrap();
        assert_eq!(stored.hold_deadline, Some(30));
    }
}
