use crate::config::ScheduleConfig;
use crate::error::{AppError, SchedulerError};
use chrono::{DateTime, Duration, Local, NaiveTime, TimeZone};
use std::future::Future;

/// `now` 之后下一次 `at` 的时刻; 落在夏令时空档时顺延一小时
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> Result<DateTime<Tz>, SchedulerError> {
    let local = now.naive_local();
    let day = if local.time() < at {
        local.date()
    } else {
        local.date() + Duration::days(1)
    };
    let target = day.and_time(at);
    let tz = now.timezone();

    tz.from_local_datetime(&target)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(target + Duration::hours(1))).earliest())
        .ok_or(SchedulerError::InvalidLocalTime(target))
}

/// 每日定时任务
#[derive(Debug)]
pub struct DailySchedule<Tz: TimeZone> {
    at: NaiveTime,
    next_run: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> DailySchedule<Tz> {
    pub fn new(at: NaiveTime) -> Self {
        Self { at, next_run: None }
    }

    pub fn next_run(&self) -> Option<&DateTime<Tz>> {
        self.next_run.as_ref()
    }

    /// 到点则执行一次 job, 然后计算下一次运行时间
    pub async fn tick<F, Fut>(&mut self, now: DateTime<Tz>, job: &mut F) -> Result<bool, SchedulerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let next = match self.next_run.take() {
            Some(next) => next,
            None => next_occurrence(&now, self.at)?,
        };

        if now < next {
            self.next_run = Some(next);
            return Ok(false);
        }

        job().await;
        self.next_run = Some(next_occurrence(&now, self.at)?);
        Ok(true)
    }
}

/// 启动后立即运行一次, 之后每天 `run_at` 运行; 调度出错时退避后重试
pub async fn run_daily<F, Fut>(config: &ScheduleConfig, mut job: F) -> Result<(), AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let at = config.run_at_time()?;
    let tick = std::time::Duration::from_secs(config.tick_secs);
    let backoff = std::time::Duration::from_secs(config.error_backoff_secs);

    job().await;

    tracing::info!("Scheduler started. Will run daily at {}.", at.format("%H:%M"));
    let mut schedule = DailySchedule::<Local>::new(at);

    loop {
        match schedule.tick(Local::now(), &mut job).await {
            Ok(_) => tokio::time::sleep(tick).await,
            Err(e) => {
                tracing::error!("Scheduler error: {}", e);
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::Cell;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn one_am() -> NaiveTime {
        NaiveTime::from_hms_opt(1, 0, 0).unwrap()
    }

    #[test]
    fn test_next_occurrence_same_day_or_tomorrow() {
        assert_eq!(
            next_occurrence(&utc(2024, 3, 10, 0, 30), one_am()).unwrap(),
            utc(2024, 3, 10, 1, 0)
        );
        assert_eq!(
            next_occurrence(&utc(2024, 3, 10, 1, 0), one_am()).unwrap(),
            utc(2024, 3, 11, 1, 0)
        );
        assert_eq!(
            next_occurrence(&utc(2024, 12, 31, 23, 59), one_am()).unwrap(),
            utc(2025, 1, 1, 1, 0)
        );
    }

    #[tokio::test]
    async fn test_tick_runs_once_per_day() {
        let runs = Cell::new(0);
        let mut job = || {
            runs.set(runs.get() + 1);
            async {}
        };
        let mut schedule = DailySchedule::<Utc>::new(one_am());

        // 首次 tick 只计算下一次运行时间
        assert!(!schedule.tick(utc(2024, 3, 10, 0, 0), &mut job).await.unwrap());
        assert_eq!(schedule.next_run(), Some(&utc(2024, 3, 10, 1, 0)));

        assert!(!schedule.tick(utc(2024, 3, 10, 0, 59), &mut job).await.unwrap());
        assert!(schedule.tick(utc(2024, 3, 10, 1, 0), &mut job).await.unwrap());
        assert!(!schedule.tick(utc(2024, 3, 10, 1, 1), &mut job).await.unwrap());
        assert_eq!(runs.get(), 1);
        assert_eq!(schedule.next_run(), Some(&utc(2024, 3, 11, 1, 0)));

        assert!(schedule.tick(utc(2024, 3, 11, 1, 0), &mut job).await.unwrap());
        assert_eq!(runs.get(), 2);
    }
}
