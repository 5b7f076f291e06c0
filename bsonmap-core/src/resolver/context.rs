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

use crate::config::EncodeOptions;
use crate::error::Error;
use crate::io::{BsonReader, BsonWriter};
use crate::resolver::registry::Registry;
use crate::types::ElementType;
use crate::value::codec::DepthLimit;

pub struct WriteContext<'a> {
    pub writer: &'a mut BsonWriter,
    registry: &'a Registry,
    id_first: bool,
    representation: Option<ElementType>,
    max_depth: u32,
    current_depth: u32,
}

impl<'a> WriteContext<'a> {
    pub fn new(registry: &'a Registry, writer: &'a mut BsonWriter) -> WriteContext<'a> {
        Self::with_options(registry, writer, &EncodeOptions::default())
    }

    pub fn with_options(
        registry: &'a Registry,
        writer: &'a mut BsonWriter,
        options: &EncodeOptions,
    ) -> WriteContext<'a> {
        let config = registry.config();
        WriteContext {
            writer,
            registry,
            id_first: options.id_first.unwrap_or(config.is_id_first()),
            representation: None,
            max_depth: config.max_depth(),
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    #[inline(always)]
    pub fn is_id_first(&self) -> bool {
        self.id_first
    }

    /// Sets the representation the next scalar write should honor.
    #[inline(always)]
    pub fn set_representation(&mut self, representation: Option<ElementType>) {
        self.representation = representation;
    }

    /// Consumes the pending representation, if any.
    #[inline(always)]
    pub fn take_representation(&mut self) -> Option<ElementType> {
        self.representation.take()
    }

    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        if self.current_depth > self.max_depth {
            return Err(Error::depth_exceed(format!(
                "Maximum document nesting depth ({}) exceeded while encoding",
                self.max_depth
            )));
        }
        Ok(())
    }

    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }
}

pub struct ReadContext<'a, 'bf> {
    pub reader: &'a mut BsonReader<'bf>,
    registry: &'a Registry,
    representation: Option<ElementType>,
    max_depth: u32,
    current_depth: u32,
}

impl<'a, 'bf> ReadContext<'a, 'bf> {
    pub fn new(registry: &'a Registry, reader: &'a mut BsonReader<'bf>) -> ReadContext<'a, 'bf> {
        ReadContext {
            reader,
            registry,
            representation: None,
            max_depth: registry.config().max_depth(),
            current_depth: 0,
        }
    }

    #[inline(always)]
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    #[inline(always)]
    pub fn set_representation(&mut self, representation: Option<ElementType>) {
        self.representation = representation;
    }

    #[inline(always)]
    pub fn take_representation(&mut self) -> Option<ElementType> {
        self.representation.take()
    }

    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.current_depth += 1;
        if self.current_depth > self.max_depth {
            return Err(Error::depth_exceed(format!(
                "Maximum document nesting depth ({}) exceeded. Current depth: {}. \
                 The input may be corrupted or nest deeper than max_depth allows.",
                self.max_depth, self.current_depth
            )));
        }
        Ok(())
    }

    pub fn dec_depth(&mut self) {
        self.current_depth = self.current_depth.saturating_sub(1);
    }

    /// Nesting budget left for an untyped value read at the current depth.
    #[inline(always)]
    pub fn depth_limit(&self) -> DepthLimit {
        DepthLimit::starting_at(self.current_depth, self.max_depth)
    }
}
