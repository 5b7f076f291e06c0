// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::Error;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{BsonDefault, Serializer};
use crate::types::ElementType;

const MILLIS_PER_DAY: i64 = 86_400_000;

fn write_millis(context: &mut WriteContext, millis: i64, text: impl FnOnce() -> String) -> Result<(), Error> {
    match context.take_representation().unwrap_or(ElementType::DateTime) {
        ElementType::DateTime => context.writer.write_date_time(millis),
        ElementType::Int64 => context.writer.write_int64(millis),
        ElementType::String => context.writer.write_string(&text()),
        other => Err(Error::encode_error(format!(
            "{other:?} is not a valid representation for a date"
        ))),
    }
}

fn read_utc(context: &mut ReadContext) -> Result<DateTime<Utc>, Error> {
    context.take_representation();
    let reader = &mut *context.reader;
    let millis = match reader.current_type()? {
        ElementType::DateTime => reader.read_date_time()?,
        ElementType::Int64 => reader.read_int64()?,
        ElementType::String => {
            let text = reader.read_string()?;
            return DateTime::parse_from_rfc3339(&text)
                .map(|date| date.with_timezone(&Utc))
                .map_err(|e| Error::invalid_data(format!("'{text}' is not an RFC 3339 date: {e}")));
        }
        other => return Err(Error::type_mismatch(ElementType::DateTime, other)),
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::invalid_data(format!("date {millis} is out of range")))
}

impl Serializer for DateTime<Utc> {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        write_millis(context, self.timestamp_millis(), || self.to_rfc3339())
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        read_utc(context)
    }

    fn bson_is_default(&self) -> bool {
        self.timestamp_millis() == 0
    }

    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::DateTime)
    }
}

impl BsonDefault for DateTime<Utc> {
    fn bson_default() -> Self {
        DateTime::<Utc>::default()
    }
}

/// Naive date-times are taken to be UTC.
impl Serializer for NaiveDateTime {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        let utc = self.and_utc();
        write_millis(context, utc.timestamp_millis(), || utc.to_rfc3339())
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        Ok(read_utc(context)?.naive_utc())
    }

    fn bson_is_default(&self) -> bool {
        *self == NaiveDateTime::default()
    }

    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::DateTime)
    }
}

impl BsonDefault for NaiveDateTime {
    fn bson_default() -> Self {
        NaiveDateTime::default()
    }
}

/// Dates are written as midnight UTC.
impl Serializer for NaiveDate {
    fn bson_write(&self, context: &mut WriteContext) -> Result<(), Error> {
        let days = self.signed_duration_since(NaiveDate::default()).num_days();
        write_millis(context, days * MILLIS_PER_DAY, || self.to_string())
    }

    fn bson_read(context: &mut ReadContext) -> Result<Self, Error> {
        let millis = read_utc(context)?.timestamp_millis();
        NaiveDate::default()
            .checked_add_signed(Duration::days(millis.div_euclid(MILLIS_PER_DAY)))
            .ok_or_else(|| Error::invalid_data(format!("date {millis} is out of range")))
    }

    fn bson_is_default(&self) -> bool {
        *self == NaiveDate::default()
    }

    fn bson_element_type() -> Option<ElementType> {
        Some(ElementType::DateTime)
    }
}

impl BsonDefault for NaiveDate {
    fn bson_default() -> Self {
        NaiveDate::default()
    }
}
