//! 작업 스케줄.
//!
//! 환율 갱신은 매일 `update_time - lead`에, BVC 시세 갱신은 평일 `update_time`에
//! 실행됩니다. 시각은 모두 설정된 시간대의 현지 시각입니다.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::config::{ScheduleConfig, MAX_RATE_LEAD_MINUTES};
use crate::orchestrator::TaskSelector;

/// 현지 시각 기준 반복 규칙.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleExpression {
    /// 매일 지정 시각
    DailyAt(NaiveTime),
    /// 월~금 지정 시각
    WeekdaysAt(NaiveTime),
}

impl ScheduleExpression {
    pub fn time(&self) -> NaiveTime {
        match self {
            Self::DailyAt(time) | Self::WeekdaysAt(time) => *time,
        }
    }

    /// 해당 일자에 실행되는지 확인합니다.
    pub fn fires_on(&self, date: NaiveDate) -> bool {
        match self {
            Self::DailyAt(_) => true,
            Self::WeekdaysAt(_) => !matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }

    /// `from` 이후(미포함) 가장 가까운 실행 시각.
    pub fn next_occurrence(&self, from: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        let mut date = from.with_timezone(&tz).date_naive();

        // 평일 규칙은 최대 사흘(금 → 월)을 건너뜀
        for _ in 0..8 {
            if self.fires_on(date) {
                if let Some(candidate) = resolve_local(tz, date, self.time()) {
                    if candidate > from {
                        return Some(candidate);
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }
}

/// 현지 일시를 UTC로 바꿉니다.
///
/// DST로 겹치는 시각은 이른 쪽, 건너뛰는 시각은 한 시간 뒤를 사용합니다.
fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let naive = date.and_time(time);
    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    };
    local.map(|dt| dt.with_timezone(&Utc))
}

/// 환율/시세 갱신 스케줄.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub timezone: Tz,
    pub rates: ScheduleExpression,
    pub prices: ScheduleExpression,
}

impl Schedule {
    /// 갱신 시각과 환율 선행 시간으로 스케줄을 만듭니다.
    ///
    /// 선행 시간이 자정을 넘으면 전날 시각으로 감깁니다 (00:05 - 10분 = 23:55).
    /// 선행 시간은 0~1439분 범위로 제한됩니다.
    pub fn new(update_time: NaiveTime, rate_lead_minutes: i64, timezone: Tz) -> Self {
        let lead = rate_lead_minutes.clamp(0, MAX_RATE_LEAD_MINUTES);
        let (rate_time, _) = update_time.overflowing_sub_signed(Duration::minutes(lead));

        Self {
            timezone,
            rates: ScheduleExpression::DailyAt(rate_time),
            prices: ScheduleExpression::WeekdaysAt(update_time),
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(config.update_time, config.rate_lead_minutes, config.timezone)
    }

    pub fn expression(&self, task: TaskSelector) -> ScheduleExpression {
        match task {
            TaskSelector::Rates => self.rates,
            TaskSelector::Prices => self.prices,
        }
    }

    pub fn next_occurrence(&self, task: TaskSelector, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.expression(task).next_occurrence(from, self.timezone)
    }

    /// 설정 시간대 기준 실행 일자.
    pub fn run_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }
}
