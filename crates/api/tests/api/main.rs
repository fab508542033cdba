mod docs;
mod helpers;
mod stations_daily;
mod stations_hourly;
