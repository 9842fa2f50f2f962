use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use marquee_core::{
    Booking, BookingError, BookingStore, BookingTx, PromoCode, SeatChange, SeatMutation,
    SeatRecord, ShowtimeContext,
};

/// Postgres-backed store. Seat batches are locked with `SELECT ... FOR
/// UPDATE` scoped to the exact seat ids, so unrelated seats of the same
/// showtime never contend.
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Log the full failure server-side, surface only a short diagnostic code.
fn storage(err: sqlx::Error) -> BookingError {
    let code = Uuid::new_v4().simple().to_string()[..8].to_string();
    tracing::error!(code = %code, error = %err, "storage failure");
    BookingError::Storage(code)
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    showtime_id: Uuid,
    seat_row: String,
    seat_column: i32,
    location: String,
    seat_type: String,
    price: i64,
    is_active: bool,
    vacant: bool,
    held: bool,
    held_by: Option<Uuid>,
    held_until: Option<DateTime<Utc>>,
}

impl From<SeatRow> for SeatRecord {
    fn from(row: SeatRow) -> Self {
        SeatRecord {
            seat_id: row.id,
            showtime_id: row.showtime_id,
            row: row.seat_row,
            column: row.seat_column,
            location: row.location,
            seat_type: row.seat_type,
            price: row.price,
            is_active: row.is_active,
            vacant: row.vacant,
            held: row.held,
            held_by: row.held_by,
            held_until: row.held_until,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PromoRow {
    id: Uuid,
    code: String,
    discount_value: i64,
    max_redemptions: i32,
    times_used: i32,
    is_active: bool,
}

impl From<PromoRow> for PromoCode {
    fn from(row: PromoRow) -> Self {
        PromoCode {
            id: row.id,
            code: row.code,
            discount_value: row.discount_value,
            max_redemptions: row.max_redemptions,
            times_used: row.times_used,
            is_active: row.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ContextRow {
    showtime_id: Uuid,
    event_id: Uuid,
    venue_id: Uuid,
    city_id: Uuid,
    showtime_active: bool,
    venue_active: bool,
    city_active: bool,
}

impl From<ContextRow> for ShowtimeContext {
    fn from(row: ContextRow) -> Self {
        ShowtimeContext {
            showtime_id: row.showtime_id,
            event_id: row.event_id,
            venue_id: row.venue_id,
            city_id: row.city_id,
            showtime_active: row.showtime_active,
            venue_active: row.venue_active,
            city_active: row.city_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    reference: String,
    seat_id: Uuid,
    showtime_id: Uuid,
    user_id: Uuid,
    price: i64,
    discount_share: i64,
    total_amount: i64,
    payment_method: String,
    checked_in: bool,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            reference: row.reference,
            seat_id: row.seat_id,
            showtime_id: row.showtime_id,
            user_id: row.user_id,
            price: row.price,
            discount_share: row.discount_share,
            total_amount: row.total_amount,
            payment_method: row.payment_method,
            checked_in: row.checked_in,
            created_at: row.created_at,
        }
    }
}

const SEAT_COLUMNS: &str = "id, showtime_id, seat_row, seat_column, location, seat_type, \
                            price, is_active, vacant, held, held_by, held_until";

const CONTEXT_QUERY: &str = "SELECT s.id AS showtime_id, s.event_id, v.id AS venue_id, \
                             c.id AS city_id, s.is_active AS showtime_active, \
                             v.is_active AS venue_active, c.is_active AS city_active \
                             FROM showtimes s \
                             JOIN venues v ON v.id = s.venue_id \
                             JOIN cities c ON c.id = v.city_id \
                             WHERE s.id = $1";

struct PgBookingTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn begin(&self) -> Result<Box<dyn BookingTx>, BookingError> {
        let tx = self.pool.begin().await.map_err(storage)?;
        Ok(Box::new(PgBookingTx { tx }))
    }

    async fn seats(
        &self,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError> {
        let sql = format!(
            "SELECT {SEAT_COLUMNS} FROM seats \
             WHERE showtime_id = $1 AND id = ANY($2) AND is_active"
        );
        let rows: Vec<SeatRow> = sqlx::query_as(&sql)
            .bind(showtime_id)
            .bind(seat_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;
        if rows.len() != seat_ids.len() {
            return Err(BookingError::NotFound("seat".to_string()));
        }
        Ok(rows.into_iter().map(SeatRecord::from).collect())
    }

    async fn showtime(
        &self,
        showtime_id: Uuid,
    ) -> Result<Option<ShowtimeContext>, BookingError> {
        let row: Option<ContextRow> = sqlx::query_as(CONTEXT_QUERY)
            .bind(showtime_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;
        Ok(row.map(ShowtimeContext::from))
    }

    async fn find_promo(&self, code: &str) -> Result<Option<PromoCode>, BookingError> {
        let row: Option<PromoRow> = sqlx::query_as(
            "SELECT id, code, discount_value, max_redemptions, times_used, is_active \
             FROM promo_codes WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;
        Ok(row.map(PromoCode::from))
    }

    async fn bookings_for_reference(
        &self,
        reference: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT reference, seat_id, showtime_id, user_id, price, discount_share, \
             total_amount, payment_method, checked_in, created_at \
             FROM bookings WHERE reference = $1 ORDER BY created_at",
        )
        .bind(reference)
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;
        Ok(rows.into_iter().map(Booking::from).collect())
    }
}

#[async_trait]
impl BookingTx for PgBookingTx {
    async fn lock_seats(
        &mut self,
        showtime_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError> {
        let sql = format!(
            "SELECT {SEAT_COLUMNS} FROM seats \
             WHERE showtime_id = $1 AND id = ANY($2) AND is_active \
             FOR UPDATE"
        );
        let rows: Vec<SeatRow> = sqlx::query_as(&sql)
            .bind(showtime_id)
            .bind(seat_ids)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(storage)?;
        // All-or-nothing: a missing or inactive seat fails the whole batch.
        // The caller rolls back, which drops any row locks taken above.
        if rows.len() != seat_ids.len() {
            return Err(BookingError::NotFound("seat".to_string()));
        }
        Ok(rows.into_iter().map(SeatRecord::from).collect())
    }

    async fn lock_seats_held_by(
        &mut self,
        user_id: Uuid,
        seat_ids: &[Uuid],
    ) -> Result<Vec<SeatRecord>, BookingError> {
        let sql = format!(
            "SELECT {SEAT_COLUMNS} FROM seats \
             WHERE held AND held_by = $1 AND id = ANY($2) \
             FOR UPDATE"
        );
        let rows: Vec<SeatRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(seat_ids)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(storage)?;
        Ok(rows.into_iter().map(SeatRecord::from).collect())
    }

    async fn commit_seat_update(
        &mut self,
        mutations: &[SeatMutation],
    ) -> Result<(), BookingError> {
        let mut affected: usize = 0;
        for mutation in mutations {
            let result = match &mutation.change {
                SeatChange::Hold { user_id, until } => {
                    sqlx::query(
                        "UPDATE seats SET held = TRUE, held_by = $2, held_until = $3 \
                         WHERE id = $1 AND vacant",
                    )
                    .bind(mutation.seat_id)
                    .bind(user_id)
                    .bind(until)
                    .execute(&mut *self.tx)
                    .await
                }
                SeatChange::Release => {
                    sqlx::query(
                        "UPDATE seats SET held = FALSE, held_by = NULL, held_until = NULL \
                         WHERE id = $1",
                    )
                    .bind(mutation.seat_id)
                    .execute(&mut *self.tx)
                    .await
                }
                SeatChange::Book => {
                    sqlx::query(
                        "UPDATE seats SET vacant = FALSE, held = FALSE, \
                         held_by = NULL, held_until = NULL \
                         WHERE id = $1 AND vacant",
                    )
                    .bind(mutation.seat_id)
                    .execute(&mut *self.tx)
                    .await
                }
            };
            affected += result.map_err(storage)?.rows_affected() as usize;
        }
        if affected != mutations.len() {
            return Err(BookingError::ConcurrencyViolation {
                expected: mutations.len(),
                affected,
            });
        }
        Ok(())
    }

    async fn insert_bookings(&mut self, rows: &[Booking]) -> Result<(), BookingError> {
        for booking in rows {
            sqlx::query(
                "INSERT INTO bookings (reference, seat_id, showtime_id, user_id, price, \
                 discount_share, total_amount, payment_method, checked_in, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&booking.reference)
            .bind(booking.seat_id)
            .bind(booking.showtime_id)
            .bind(booking.user_id)
            .bind(booking.price)
            .bind(booking.discount_share)
            .bind(booking.total_amount)
            .bind(&booking.payment_method)
            .bind(booking.checked_in)
            .bind(booking.created_at)
            .execute(&mut *self.tx)
            .await
            .map_err(storage)?;
        }
        Ok(())
    }

    async fn redeem_promo(&mut self, promo_id: Uuid) -> Result<Option<i64>, BookingError> {
        // Conditional increment: first commit wins, no row means the cap was
        // consumed by a concurrent booking. Returns the stored discount
        // value; the caller never prices from session data.
        let value: Option<i64> = sqlx::query_scalar(
            "UPDATE promo_codes SET times_used = times_used + 1 \
             WHERE id = $1 AND is_active AND times_used < max_redemptions \
             RETURNING discount_value",
        )
        .bind(promo_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(storage)?;
        Ok(value)
    }

    async fn showtime_context(
        &mut self,
        showtime_id: Uuid,
    ) -> Result<Option<ShowtimeContext>, BookingError> {
        let row: Option<ContextRow> = sqlx::query_as(CONTEXT_QUERY)
            .bind(showtime_id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(storage)?;
        Ok(row.map(ShowtimeContext::from))
    }

    async fn commit(self: Box<Self>) -> Result<(), BookingError> {
        self.tx.commit().await.map_err(storage)
    }

    async fn rollback(self: Box<Self>) -> Result<(), BookingError> {
        self.tx.rollback().await.map_err(storage)
    }
}
