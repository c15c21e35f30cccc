use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marquee_core::repository::{CatalogRepository, ReservationStore};
use marquee_core::{EngineError, EngineResult};
use marquee_domain::{
    format_booking_number, Booking, BookingDraft, BookingStatus, CapacityHold, ClaimKind,
    ClaimStatus, HoldGrant, Listing, ListingStatus, Seat, SeatClaim, Slot, SweepReport,
};

/// Postgres-backed reservation store. Every trait method maps to one
/// transaction with guarded row updates, so the atomicity contract matches
/// the in-memory store: no read-modify-write ever crosses a statement
/// boundary unguarded.
pub struct PgStore {
    pool: PgPool,
    booking_prefix: String,
}

impl PgStore {
    pub fn new(pool: PgPool, booking_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            booking_prefix: booking_prefix.into(),
        }
    }
}

fn storage(err: sqlx::Error) -> EngineError {
    EngineError::Storage(err.to_string())
}

fn parse_claim_status(s: &str) -> EngineResult<ClaimStatus> {
    match s {
        "AVAILABLE" => Ok(ClaimStatus::Available),
        "LOCKED" => Ok(ClaimStatus::Locked),
        "BOOKED" => Ok(ClaimStatus::Booked),
        other => Err(EngineError::Storage(format!(
            "unknown claim status: {other}"
        ))),
    }
}

fn parse_booking_status(s: &str) -> EngineResult<BookingStatus> {
    match s {
        "CONFIRMED" => Ok(BookingStatus::Confirmed),
        "CANCELLED" => Ok(BookingStatus::Cancelled),
        "COMPLETED" => Ok(BookingStatus::Completed),
        other => Err(EngineError::Storage(format!(
            "unknown booking status: {other}"
        ))),
    }
}

fn parse_listing_status(s: &str) -> ListingStatus {
    match s {
        "ACTIVE" => ListingStatus::Active,
        "DRAFT" => ListingStatus::Draft,
        _ => ListingStatus::Archived,
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    title: String,
    city: Option<String>,
    price_cents: Option<i32>,
    currency: String,
    total_capacity: Option<i32>,
    booked_count: i32,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<ListingRow> for Listing {
    fn from(row: ListingRow) -> Self {
        Listing {
            id: row.id,
            title: row.title,
            city: row.city,
            price_cents: row.price_cents,
            currency: row.currency,
            total_capacity: row.total_capacity,
            booked_count: row.booked_count,
            status: parse_listing_status(&row.status),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: Uuid,
    listing_id: Uuid,
    layout_id: Option<Uuid>,
    slot_date: NaiveDate,
    start_time: NaiveTime,
    end_time: Option<NaiveTime>,
    capacity: i32,
    booked_count: i32,
    price_override_cents: Option<i32>,
    is_active: bool,
}

impl From<SlotRow> for Slot {
    fn from(row: SlotRow) -> Self {
        Slot {
            id: row.id,
            listing_id: row.listing_id,
            layout_id: row.layout_id,
            slot_date: row.slot_date,
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.capacity,
            booked_count: row.booked_count,
            price_override_cents: row.price_override_cents,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    layout_id: Uuid,
    row_label: String,
    number: i32,
    category: String,
    price_cents: i32,
    is_aisle: bool,
    is_accessible: bool,
}

impl From<SeatRow> for Seat {
    fn from(row: SeatRow) -> Self {
        Seat {
            id: row.id,
            layout_id: row.layout_id,
            row_label: row.row_label,
            number: row.number,
            category: row.category,
            price_cents: row.price_cents,
            is_aisle: row.is_aisle,
            is_accessible: row.is_accessible,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    slot_id: Uuid,
    seat_id: Uuid,
    status: String,
    locked_by: Option<Uuid>,
    locked_until: Option<DateTime<Utc>>,
}

impl ClaimRow {
    fn into_claim(self) -> EngineResult<SeatClaim> {
        Ok(SeatClaim {
            slot_id: self.slot_id,
            seat_id: self.seat_id,
            status: parse_claim_status(&self.status)?,
            locked_by: self.locked_by,
            locked_until: self.locked_until,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HoldRow {
    id: Uuid,
    slot_id: Uuid,
    user_id: Uuid,
    quantity: i32,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<HoldRow> for CapacityHold {
    fn from(row: HoldRow) -> Self {
        CapacityHold {
            id: row.id,
            slot_id: row.slot_id,
            user_id: row.user_id,
            quantity: row.quantity,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    listing_id: Uuid,
    slot_id: Uuid,
    booking_number: String,
    quantity: i32,
    total_amount_cents: i32,
    currency: String,
    status: String,
    event_date: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl BookingRow {
    fn into_booking(self, seat_ids: Vec<Uuid>) -> EngineResult<Booking> {
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            listing_id: self.listing_id,
            slot_id: self.slot_id,
            booking_number: self.booking_number,
            quantity: self.quantity,
            total_amount_cents: self.total_amount_cents,
            currency: self.currency,
            seat_ids,
            status: parse_booking_status(&self.status)?,
            event_date: self.event_date,
            notes: self.notes,
            created_at: self.created_at,
            cancelled_at: self.cancelled_at,
        })
    }
}

impl PgStore {
    async fn booking_seat_ids(&self, booking_id: Uuid) -> EngineResult<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT seat_id FROM booking_seats WHERE booking_id = $1")
                .bind(booking_id)
                .fetch_all(&self.pool)
                .await
                .map_err(storage)?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl CatalogRepository for PgStore {
    async fn get_listing(&self, listing_id: Uuid) -> EngineResult<Option<Listing>> {
        let row: Option<ListingRow> = sqlx::query_as(
            "SELECT id, title, city, price_cents, currency, total_capacity, booked_count, status, created_at \
             FROM listings WHERE id = $1",
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(Listing::from))
    }

    async fn get_slot(&self, slot_id: Uuid) -> EngineResult<Option<Slot>> {
        let row: Option<SlotRow> = sqlx::query_as(
            "SELECT id, listing_id, layout_id, slot_date, start_time, end_time, capacity, \
             booked_count, price_override_cents, is_active FROM slots WHERE id = $1",
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(Slot::from))
    }

    async fn layout_seats(&self, layout_id: Uuid) -> EngineResult<Vec<Seat>> {
        let rows: Vec<SeatRow> = sqlx::query_as(
            "SELECT id, layout_id, row_label, number, category, price_cents, is_aisle, is_accessible \
             FROM seats WHERE layout_id = $1 ORDER BY row_label, number",
        )
        .bind(layout_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Seat::from).collect())
    }

    async fn seats_by_ids(&self, seat_ids: &[Uuid]) -> EngineResult<Vec<Seat>> {
        let rows: Vec<SeatRow> = sqlx::query_as(
            "SELECT id, layout_id, row_label, number, category, price_cents, is_aisle, is_accessible \
             FROM seats WHERE id = ANY($1)",
        )
        .bind(seat_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Seat::from).collect())
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn lock_seats(
        &self,
        slot_id: Uuid,
        seat_ids: &[Uuid],
        holder: Uuid,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Guarded upsert per seat: the WHERE clause makes a contested row a
        // zero-row update, which fails the whole request. The transaction
        // rolls back on drop, so a partial grant never survives.
        let mut unavailable = Vec::new();
        for seat_id in seat_ids {
            let result = sqlx::query(
                "INSERT INTO seat_claims (slot_id, seat_id, status, locked_by, locked_until) \
                 VALUES ($1, $2, 'LOCKED', $3, $4) \
                 ON CONFLICT (slot_id, seat_id) DO UPDATE \
                 SET status = 'LOCKED', locked_by = $3, locked_until = $4 \
                 WHERE seat_claims.status = 'AVAILABLE' \
                    OR (seat_claims.status = 'LOCKED' \
                        AND (seat_claims.locked_until < $5 OR seat_claims.locked_by = $3))",
            )
            .bind(slot_id)
            .bind(seat_id)
            .bind(holder)
            .bind(expires_at)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

            if result.rows_affected() == 0 {
                unavailable.push(*seat_id);
            }
        }

        if !unavailable.is_empty() {
            return Err(EngineError::SeatConflict { unavailable });
        }

        tx.commit().await.map_err(storage)?;
        Ok(seat_ids.to_vec())
    }

    async fn release_seat_locks(
        &self,
        slot_id: Uuid,
        holder: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Uuid>> {
        let rows: Vec<(Uuid, Option<DateTime<Utc>>)> = sqlx::query_as(
            "DELETE FROM seat_claims \
             WHERE slot_id = $1 AND locked_by = $2 AND status = 'LOCKED' \
             RETURNING seat_id, locked_until",
        )
        .bind(slot_id)
        .bind(holder)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        // Expired rows are dropped too, but only live locks count as
        // released.
        Ok(rows
            .into_iter()
            .filter(|(_, until)| until.map_or(false, |u| u >= now))
            .map(|(seat_id, _)| seat_id)
            .collect())
    }

    async fn seat_claims(&self, slot_id: Uuid) -> EngineResult<Vec<SeatClaim>> {
        let rows: Vec<ClaimRow> = sqlx::query_as(
            "SELECT slot_id, seat_id, status, locked_by, locked_until \
             FROM seat_claims WHERE slot_id = $1",
        )
        .bind(slot_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        rows.into_iter().map(ClaimRow::into_claim).collect()
    }

    async fn create_hold(
        &self,
        slot_id: Uuid,
        user_id: Uuid,
        quantity: i32,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> EngineResult<HoldGrant> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        // Row-exclusive read of the capacity counter serializes concurrent
        // holds on the same slot.
        let slot: Option<(i32, i32)> = sqlx::query_as(
            "SELECT capacity, booked_count FROM slots WHERE id = $1 FOR UPDATE",
        )
        .bind(slot_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;
        let (capacity, booked_count) =
            slot.ok_or_else(|| EngineError::not_found("Time slot"))?;

        // An existing hold is replaced; its quantity is credited back
        // before the capacity check so it is never double-counted.
        let credit: Option<(i32,)> = sqlx::query_as(
            "SELECT quantity FROM capacity_holds WHERE slot_id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(slot_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;
        let credit = credit.map(|(q,)| q).unwrap_or(0);

        let available = capacity - (booked_count - credit);
        if quantity > available {
            return Err(EngineError::CapacityConflict {
                requested: quantity,
                available: available.max(0),
            });
        }

        sqlx::query("UPDATE slots SET booked_count = booked_count - $2 + $3 WHERE id = $1")
            .bind(slot_id)
            .bind(credit)
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let hold_id = Uuid::new_v4();
        let row: HoldRow = sqlx::query_as(
            "INSERT INTO capacity_holds (id, slot_id, user_id, quantity, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (slot_id, user_id) DO UPDATE SET quantity = $4, expires_at = $5 \
             RETURNING id, slot_id, user_id, quantity, expires_at, created_at",
        )
        .bind(hold_id)
        .bind(slot_id)
        .bind(user_id)
        .bind(quantity)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        Ok(HoldGrant {
            hold: row.into(),
            remaining_capacity: capacity - (booked_count - credit + quantity),
            ttl_seconds: (expires_at - now).num_seconds(),
        })
    }

    async fn release_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<i32>> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let deleted: Option<(i32,)> = sqlx::query_as(
            "DELETE FROM capacity_holds WHERE slot_id = $1 AND user_id = $2 RETURNING quantity",
        )
        .bind(slot_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;

        let released = match deleted {
            Some((quantity,)) => {
                sqlx::query(
                    "UPDATE slots SET booked_count = GREATEST(0, booked_count - $2) WHERE id = $1",
                )
                .bind(slot_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
                Some(quantity)
            }
            None => None,
        };

        tx.commit().await.map_err(storage)?;
        Ok(released)
    }

    async fn get_hold(&self, slot_id: Uuid, user_id: Uuid) -> EngineResult<Option<CapacityHold>> {
        let row: Option<HoldRow> = sqlx::query_as(
            "SELECT id, slot_id, user_id, quantity, expires_at, created_at \
             FROM capacity_holds WHERE slot_id = $1 AND user_id = $2",
        )
        .bind(slot_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(CapacityHold::from))
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> EngineResult<SweepReport> {
        let mut report = SweepReport::default();

        let result = sqlx::query(
            "DELETE FROM seat_claims WHERE status = 'LOCKED' AND locked_until < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage)?;
        report.seats_released = result.rows_affected() as usize;

        // Delete-and-decrement in one statement so each hold's reclaim is
        // atomic against a racing release or confirm.
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "WITH expired AS ( \
                 DELETE FROM capacity_holds WHERE expires_at < $1 \
                 RETURNING slot_id, quantity \
             ), agg AS ( \
                 SELECT slot_id, SUM(quantity) AS qty, COUNT(*) AS holds \
                 FROM expired GROUP BY slot_id \
             ) \
             UPDATE slots s SET booked_count = GREATEST(0, s.booked_count - agg.qty::int) \
             FROM agg WHERE s.id = agg.slot_id \
             RETURNING agg.holds, agg.qty",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        for (holds, qty) in rows {
            report.holds_released += holds as usize;
            report.quantity_released += qty as i32;
        }
        Ok(report)
    }

    async fn commit_booking(
        &self,
        draft: BookingDraft,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let seat_ids = match &draft.claim {
            ClaimKind::Seats(seat_ids) => {
                let updated = sqlx::query(
                    "UPDATE seat_claims \
                     SET status = 'BOOKED', locked_by = NULL, locked_until = NULL \
                     WHERE slot_id = $1 AND seat_id = ANY($2) \
                       AND status = 'LOCKED' AND locked_by = $3 AND locked_until >= $4",
                )
                .bind(draft.slot_id)
                .bind(seat_ids.to_vec())
                .bind(draft.user_id)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;

                if updated.rows_affected() != seat_ids.len() as u64 {
                    // Classify before rolling back: a seat visibly taken by
                    // someone else is a conflict, anything else is a lapsed
                    // claim.
                    let rows: Vec<ClaimRow> = sqlx::query_as(
                        "SELECT slot_id, seat_id, status, locked_by, locked_until \
                         FROM seat_claims WHERE slot_id = $1 AND seat_id = ANY($2)",
                    )
                    .bind(draft.slot_id)
                    .bind(seat_ids.to_vec())
                    .fetch_all(&mut *tx)
                    .await
                    .map_err(storage)?;

                    let mut contested = Vec::new();
                    for row in rows {
                        let claim = row.into_claim()?;
                        match claim.effective_status(now) {
                            ClaimStatus::Locked if claim.locked_by == Some(draft.user_id) => {}
                            ClaimStatus::Booked | ClaimStatus::Locked => {
                                contested.push(claim.seat_id)
                            }
                            ClaimStatus::Available => {}
                        }
                    }
                    return Err(if contested.is_empty() {
                        EngineError::ExpiredClaim("seat lock missing or expired".to_string())
                    } else {
                        EngineError::SeatConflict {
                            unavailable: contested,
                        }
                    });
                }

                let counted = sqlx::query(
                    "UPDATE slots SET booked_count = booked_count + $2 \
                     WHERE id = $1 AND booked_count + $2 <= capacity",
                )
                .bind(draft.slot_id)
                .bind(draft.quantity)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
                if counted.rows_affected() != 1 {
                    let remaining: Option<(i32,)> = sqlx::query_as(
                        "SELECT capacity - booked_count FROM slots WHERE id = $1",
                    )
                    .bind(draft.slot_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(storage)?;
                    return Err(EngineError::CapacityConflict {
                        requested: draft.quantity,
                        available: remaining.map(|(r,)| r.max(0)).unwrap_or(0),
                    });
                }
                seat_ids.clone()
            }
            ClaimKind::Capacity => {
                let consumed = sqlx::query(
                    "DELETE FROM capacity_holds \
                     WHERE slot_id = $1 AND user_id = $2 AND expires_at >= $3 AND quantity = $4",
                )
                .bind(draft.slot_id)
                .bind(draft.user_id)
                .bind(now)
                .bind(draft.quantity)
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
                if consumed.rows_affected() != 1 {
                    return Err(EngineError::ExpiredClaim(
                        "no active hold for this slot".to_string(),
                    ));
                }
                Vec::new()
            }
        };

        sqlx::query("UPDATE listings SET booked_count = booked_count + $2 WHERE id = $1")
            .bind(draft.listing_id)
            .bind(draft.quantity)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        // Day-scoped ordinal, allocated inside this transaction so two
        // commits on the same day can never share a number.
        let created_date = now.date_naive();
        let ordinal: (i32,) = sqlx::query_as(
            "INSERT INTO booking_sequences (seq_date, last_ordinal) VALUES ($1, 1) \
             ON CONFLICT (seq_date) DO UPDATE \
             SET last_ordinal = booking_sequences.last_ordinal + 1 \
             RETURNING last_ordinal",
        )
        .bind(created_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| EngineError::SequenceGeneration(e.to_string()))?;
        let booking_number =
            format_booking_number(&self.booking_prefix, created_date, ordinal.0 as u32);

        let booking_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO bookings (id, user_id, listing_id, slot_id, booking_number, quantity, \
             total_amount_cents, currency, status, event_date, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'CONFIRMED', $9, $10, $11)",
        )
        .bind(booking_id)
        .bind(draft.user_id)
        .bind(draft.listing_id)
        .bind(draft.slot_id)
        .bind(&booking_number)
        .bind(draft.quantity)
        .bind(draft.total_amount_cents)
        .bind(&draft.currency)
        .bind(draft.event_date)
        .bind(&draft.notes)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        for seat_id in &seat_ids {
            sqlx::query(
                "INSERT INTO booking_seats (booking_id, seat_id, slot_id) VALUES ($1, $2, $3)",
            )
            .bind(booking_id)
            .bind(seat_id)
            .bind(draft.slot_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        }

        tx.commit().await.map_err(storage)?;

        Ok(Booking {
            id: booking_id,
            user_id: draft.user_id,
            listing_id: draft.listing_id,
            slot_id: draft.slot_id,
            booking_number,
            quantity: draft.quantity,
            total_amount_cents: draft.total_amount_cents,
            currency: draft.currency,
            seat_ids,
            status: BookingStatus::Confirmed,
            event_date: draft.event_date,
            notes: draft.notes,
            created_at: now,
            cancelled_at: None,
        })
    }

    async fn cancel_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> EngineResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let row: Option<BookingRow> = sqlx::query_as(
            "SELECT id, user_id, listing_id, slot_id, booking_number, quantity, \
             total_amount_cents, currency, status, event_date, notes, created_at, cancelled_at \
             FROM bookings WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage)?;
        let row = row.ok_or_else(|| EngineError::not_found("Booking"))?;

        if row.status != "CONFIRMED" {
            return Err(EngineError::Validation(format!(
                "Only confirmed bookings can be cancelled (current status: {})",
                row.status
            )));
        }

        sqlx::query("UPDATE bookings SET status = 'CANCELLED', cancelled_at = $2 WHERE id = $1")
            .bind(booking_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        let seat_rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT seat_id FROM booking_seats WHERE booking_id = $1")
                .bind(booking_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(storage)?;
        let seat_ids: Vec<Uuid> = seat_rows.into_iter().map(|(id,)| id).collect();

        if !seat_ids.is_empty() {
            sqlx::query("DELETE FROM seat_claims WHERE slot_id = $1 AND seat_id = ANY($2)")
                .bind(row.slot_id)
                .bind(seat_ids.clone())
                .execute(&mut *tx)
                .await
                .map_err(storage)?;
        }

        sqlx::query(
            "UPDATE slots SET booked_count = GREATEST(0, booked_count - $2) WHERE id = $1",
        )
        .bind(row.slot_id)
        .bind(row.quantity)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            "UPDATE listings SET booked_count = GREATEST(0, booked_count - $2) WHERE id = $1",
        )
        .bind(row.listing_id)
        .bind(row.quantity)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        tx.commit().await.map_err(storage)?;

        let mut booking = row.into_booking(seat_ids)?;
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_at = Some(now);
        Ok(booking)
    }

    async fn get_booking(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> EngineResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "SELECT id, user_id, listing_id, slot_id, booking_number, quantity, \
             total_amount_cents, currency, status, event_date, notes, created_at, cancelled_at \
             FROM bookings WHERE id = $1 AND user_id = $2",
        )
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        match row {
            Some(row) => {
                let seat_ids = self.booking_seat_ids(row.id).await?;
                Ok(Some(row.into_booking(seat_ids)?))
            }
            None => Ok(None),
        }
    }

    async fn list_bookings(
        &self,
        user_id: Uuid,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> EngineResult<(Vec<Booking>, u64)> {
        let status_str = status.map(|s| s.as_str());

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings \
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status_str)
        .fetch_one(&self.pool)
        .await
        .map_err(storage)?;

        let offset = (page.saturating_sub(1) as i64) * limit as i64;
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT id, user_id, listing_id, slot_id, booking_number, quantity, \
             total_amount_cents, currency, status, event_date, notes, created_at, cancelled_at \
             FROM bookings \
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(status_str)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows {
            let seat_ids = self.booking_seat_ids(row.id).await?;
            bookings.push(row.into_booking(seat_ids)?);
        }
        Ok((bookings, total.0 as u64))
    }
}
